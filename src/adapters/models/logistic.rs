//! Binary logistic regression.

use serde::{Deserialize, Serialize};

use super::FitError;
use crate::ports::{check_dimension, Classifier, InferenceError};

pub const FAMILY: &str = "LogisticRegression";

/// Gradient descent settings used by [`LogisticRegression::fit`].
#[derive(Debug, Clone)]
pub struct LogisticParams {
    pub learning_rate: f64,
    pub epochs: usize,
    /// L2 penalty strength
    pub l2: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 500,
            l2: 0.01,
        }
    }
}

/// Linear model over pre-scaled features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl LogisticRegression {
    #[must_use]
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// Check that the parameters fit `n_features` and are finite.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.coefficients.len() != n_features {
            return Err(format!(
                "logistic regression has {} coefficients, expected {n_features}",
                self.coefficients.len()
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("logistic regression parameters must be finite".into());
        }
        Ok(())
    }

    fn decision(&self, features: &[f64]) -> Result<f64, InferenceError> {
        check_dimension(features, self.coefficients.len())?;
        let z = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        if z.is_finite() {
            Ok(z)
        } else {
            Err(InferenceError::NonFinite(FAMILY))
        }
    }

    /// Fit by batch gradient descent on the mean log-loss.
    ///
    /// # Errors
    /// Returns `FitError` if the dataset is empty or ragged.
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: &LogisticParams) -> Result<Self, FitError> {
        let n_features = super::check_dataset(x, y)?;
        let n = x.len() as f64;

        let mut w = vec![0.0; n_features];
        let mut b = 0.0;

        for _ in 0..params.epochs {
            let mut grad_w = vec![0.0; n_features];
            let mut grad_b = 0.0;

            for (row, &label) in x.iter().zip(y) {
                let z = w.iter().zip(row).map(|(wi, xi)| wi * xi).sum::<f64>() + b;
                let err = sigmoid(z) - f64::from(label);
                for (g, xi) in grad_w.iter_mut().zip(row) {
                    *g += err * xi;
                }
                grad_b += err;
            }

            for (wi, g) in w.iter_mut().zip(&grad_w) {
                *wi -= params.learning_rate * (g / n + params.l2 * *wi);
            }
            b -= params.learning_rate * grad_b / n;
        }

        Ok(Self::new(w, b))
    }
}

impl Classifier for LogisticRegression {
    fn family(&self) -> &str {
        FAMILY
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> Result<u8, InferenceError> {
        Ok(u8::from(self.decision(features)? > 0.0))
    }

    fn predict_probability(&self, features: &[f64]) -> Result<[f64; 2], InferenceError> {
        let p1 = sigmoid(self.decision(features)?);
        Ok([1.0 - p1, p1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_and_label() {
        let model = LogisticRegression::new(vec![1.0, -1.0], 0.0);

        let p = model.predict_probability(&[2.0, 0.0]).expect("predict");
        assert!((p[0] + p[1] - 1.0).abs() < 1e-12);
        assert!(p[1] > 0.85);
        assert_eq!(model.predict(&[2.0, 0.0]).expect("predict"), 1);
        assert_eq!(model.predict(&[0.0, 2.0]).expect("predict"), 0);

        let mid = model.predict_probability(&[1.0, 1.0]).expect("predict");
        assert!((mid[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_dimension() {
        let model = LogisticRegression::new(vec![1.0, -1.0], 0.0);
        assert_eq!(
            model.predict(&[1.0]),
            Err(InferenceError::DimensionMismatch {
                got: 1,
                expected: 2
            })
        );
    }

    #[test]
    fn test_extreme_inputs_stay_finite() {
        let model = LogisticRegression::new(vec![1.0], 0.0);
        let p = model.predict_probability(&[-1.0e6]).expect("predict");
        assert!(p[1] >= 0.0 && p[1] < 1e-12);
        assert!(model.predict_probability(&[f64::INFINITY]).is_err());
    }

    #[test]
    fn test_fit_separable() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![f64::from(i) / 10.0 - 2.0]).collect();
        let y: Vec<u8> = x.iter().map(|r| u8::from(r[0] > 0.0)).collect();

        let model = LogisticRegression::fit(&x, &y, &LogisticParams::default()).expect("fit");
        assert!(model.coefficients[0] > 0.0);
        assert_eq!(model.predict(&[1.5]).expect("predict"), 1);
        assert_eq!(model.predict(&[-1.5]).expect("predict"), 0);
    }

    #[test]
    fn test_validate() {
        assert!(LogisticRegression::new(vec![0.0; 12], 0.0).validate(12).is_ok());
        assert!(LogisticRegression::new(vec![0.0; 3], 0.0).validate(12).is_err());
        assert!(LogisticRegression::new(vec![0.0; 12], f64::NAN).validate(12).is_err());
    }
}
