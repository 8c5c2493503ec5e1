//! Clinical features for heart failure mortality prediction.
//!
//! Twelve measurements from the heart failure clinical records dataset.
//! The order of [`FEATURE_NAMES`] is the order the model and scaler were
//! fitted against and must never change.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Number of features the model consumes.
pub const FEATURE_COUNT: usize = 12;

/// Canonical feature order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "anaemia",
    "creatinine_phosphokinase",
    "diabetes",
    "ejection_fraction",
    "high_blood_pressure",
    "platelets",
    "serum_creatinine",
    "serum_sodium",
    "sex",
    "smoking",
    "time",
];

/// Declared numeric type of an input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Continuous measurement
    Float,
    /// 0/1 indicator, submitted as an integer
    Binary,
}

impl FieldKind {
    fn expected(&self) -> &'static str {
        match self {
            Self::Float => "a number",
            Self::Binary => "an integer (0 or 1)",
        }
    }
}

/// Field kinds, aligned with [`FEATURE_NAMES`].
pub const FIELD_KINDS: [FieldKind; FEATURE_COUNT] = [
    FieldKind::Float,
    FieldKind::Binary,
    FieldKind::Float,
    FieldKind::Binary,
    FieldKind::Float,
    FieldKind::Binary,
    FieldKind::Float,
    FieldKind::Float,
    FieldKind::Float,
    FieldKind::Binary,
    FieldKind::Binary,
    FieldKind::Float,
];

/// Errors raised while reading raw form input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    #[error("missing required field '{0}'")]
    Missing(&'static str),

    #[error("field '{field}' expects {expected}, got '{value}'")]
    Invalid {
        field: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Clinical inputs for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClinicalFeatures {
    /// Age in years
    pub age: f64,

    /// Decrease of red blood cells or hemoglobin: 0 = no, 1 = yes
    pub anaemia: i64,

    /// Level of the CPK enzyme in the blood (mcg/L)
    pub creatinine_phosphokinase: f64,

    /// Diabetes: 0 = no, 1 = yes
    pub diabetes: i64,

    /// Percentage of blood leaving the heart at each contraction
    pub ejection_fraction: f64,

    /// Hypertension: 0 = no, 1 = yes
    pub high_blood_pressure: i64,

    /// Platelets in the blood (kiloplatelets/mL)
    pub platelets: f64,

    /// Serum creatinine (mg/dL)
    pub serum_creatinine: f64,

    /// Serum sodium (mEq/L)
    pub serum_sodium: f64,

    /// 0 = female, 1 = male
    pub sex: i64,

    /// Smoking: 0 = no, 1 = yes
    pub smoking: i64,

    /// Follow-up period (days)
    pub time: f64,
}

fn lookup<'a>(
    form: &'a HashMap<String, String>,
    field: &'static str,
) -> Result<&'a str, FeatureError> {
    form.get(field)
        .map(|v| v.trim())
        .ok_or(FeatureError::Missing(field))
}

fn invalid(field: &'static str, kind: FieldKind, value: &str) -> FeatureError {
    FeatureError::Invalid {
        field,
        expected: kind.expected(),
        value: value.to_string(),
    }
}

fn parse_float(form: &HashMap<String, String>, field: &'static str) -> Result<f64, FeatureError> {
    let raw = lookup(form, field)?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(field, FieldKind::Float, raw))
}

fn parse_binary(form: &HashMap<String, String>, field: &'static str) -> Result<i64, FeatureError> {
    let raw = lookup(form, field)?;
    raw.parse::<i64>()
        .map_err(|_| invalid(field, FieldKind::Binary, raw))
}

impl ClinicalFeatures {
    /// Read and type-convert the twelve fields from submitted form values.
    ///
    /// Fields are read in canonical order, so the first offending field is
    /// the one reported.
    ///
    /// # Errors
    /// Returns `FeatureError` if a field is missing or not numeric.
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self, FeatureError> {
        Ok(Self {
            age: parse_float(form, "age")?,
            anaemia: parse_binary(form, "anaemia")?,
            creatinine_phosphokinase: parse_float(form, "creatinine_phosphokinase")?,
            diabetes: parse_binary(form, "diabetes")?,
            ejection_fraction: parse_float(form, "ejection_fraction")?,
            high_blood_pressure: parse_binary(form, "high_blood_pressure")?,
            platelets: parse_float(form, "platelets")?,
            serum_creatinine: parse_float(form, "serum_creatinine")?,
            serum_sodium: parse_float(form, "serum_sodium")?,
            sex: parse_binary(form, "sex")?,
            smoking: parse_binary(form, "smoking")?,
            time: parse_float(form, "time")?,
        })
    }

    /// Convert features to a vector in [`FEATURE_NAMES`] order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.age,
            self.anaemia as f64,
            self.creatinine_phosphokinase,
            self.diabetes as f64,
            self.ejection_fraction,
            self.high_blood_pressure as f64,
            self.platelets,
            self.serum_creatinine,
            self.serum_sodium,
            self.sex as f64,
            self.smoking as f64,
            self.time,
        ]
    }

    /// Validate that all features are physiologically plausible.
    ///
    /// Not applied unless range validation is enabled in the service config.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let continuous = [
            ("age", self.age, 0.0, 130.0),
            ("creatinine_phosphokinase", self.creatinine_phosphokinase, 0.0, 10_000.0),
            ("ejection_fraction", self.ejection_fraction, 0.0, 100.0),
            ("platelets", self.platelets, 0.0, 2_000_000.0),
            ("serum_creatinine", self.serum_creatinine, 0.0, 30.0),
            ("serum_sodium", self.serum_sodium, 90.0, 200.0),
            ("time", self.time, 0.0, 10_000.0),
        ];
        for (name, value, lo, hi) in continuous {
            if !(lo..=hi).contains(&value) {
                errors.push(format!("{name} {value} out of range [{lo}, {hi}]"));
            }
        }

        let binary = [
            ("anaemia", self.anaemia),
            ("diabetes", self.diabetes),
            ("high_blood_pressure", self.high_blood_pressure),
            ("sex", self.sex),
            ("smoking", self.smoking),
        ];
        for (name, value) in binary {
            if value != 0 && value != 1 {
                errors.push(format!("{name} {value} must be 0 or 1"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_form() -> HashMap<String, String> {
    [
        ("age", "65"),
        ("anaemia", "0"),
        ("creatinine_phosphokinase", "582"),
        ("diabetes", "1"),
        ("ejection_fraction", "38"),
        ("high_blood_pressure", "1"),
        ("platelets", "265000"),
        ("serum_creatinine", "1.9"),
        ("serum_sodium", "136"),
        ("sex", "1"),
        ("smoking", "0"),
        ("time", "130"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
