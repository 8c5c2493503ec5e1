//! Embedded HTML pages.

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>HeartGuard AI - Heart Failure Risk Assessment</title>
  <link rel="stylesheet" href="/static/css/style.css">
</head>
<body>
  <header>
    <h1>HeartGuard AI</h1>
    <p>Heart failure mortality risk assessment from twelve clinical measurements.</p>
  </header>

  <main>
    <form id="prediction-form" action="/predict" method="post" aria-label="Heart failure risk assessment form">
      <fieldset>
        <legend>Demographics</legend>
        <label>Age (years) <input type="number" name="age" step="any" required></label>
        <label>Sex
          <select name="sex" required>
            <option value="0">Female</option>
            <option value="1">Male</option>
          </select>
        </label>
        <label>Smoking
          <select name="smoking" required>
            <option value="0">No</option>
            <option value="1">Yes</option>
          </select>
        </label>
      </fieldset>

      <fieldset>
        <legend>Conditions</legend>
        <label>Anaemia
          <select name="anaemia" required>
            <option value="0">No</option>
            <option value="1">Yes</option>
          </select>
        </label>
        <label>Diabetes
          <select name="diabetes" required>
            <option value="0">No</option>
            <option value="1">Yes</option>
          </select>
        </label>
        <label>High blood pressure
          <select name="high_blood_pressure" required>
            <option value="0">No</option>
            <option value="1">Yes</option>
          </select>
        </label>
      </fieldset>

      <fieldset>
        <legend>Laboratory and follow-up</legend>
        <label>Creatinine phosphokinase (mcg/L) <input type="number" name="creatinine_phosphokinase" step="any" required></label>
        <label>Ejection fraction (%) <input type="number" name="ejection_fraction" step="any" required></label>
        <label>Platelets (kiloplatelets/mL) <input type="number" name="platelets" step="any" required></label>
        <label>Serum creatinine (mg/dL) <input type="number" name="serum_creatinine" step="any" required></label>
        <label>Serum sodium (mEq/L) <input type="number" name="serum_sodium" step="any" required></label>
        <label>Follow-up period (days) <input type="number" name="time" step="any" required></label>
      </fieldset>

      <button id="predict-button" type="submit">Assess risk</button>
    </form>

    <section id="result-card" style="display: none" aria-live="polite">
      <h2>Assessment</h2>
      <p>Risk level: <strong id="risk-level"></strong></p>
      <p>Death event probability: <span id="risk-percentage"></span></p>
      <p>Survival probability: <span id="survival-percentage"></span></p>
      <p id="risk-description"></p>
    </section>

    <p id="error-message" role="alert" style="display: none"></p>
  </main>

  <footer>
    <p>For educational purposes only. Not a substitute for professional medical advice.</p>
  </footer>

  <script src="/static/js/predict.js"></script>
</body>
</html>
"#;

pub const NOT_FOUND_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Page not found - HeartGuard AI</title>
</head>
<body>
  <h1>404</h1>
  <p>The page you requested does not exist.</p>
  <p><a href="/">Back to the assessment</a></p>
</body>
</html>
"#;

pub const INTERNAL_ERROR_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Server error - HeartGuard AI</title>
</head>
<body>
  <h1>500</h1>
  <p>Something went wrong while handling your request.</p>
  <p><a href="/">Back to the assessment</a></p>
</body>
</html>
"#;
