//! Standardization scaler: `(x - mean) / scale`.

use serde::{Deserialize, Serialize};

use super::FitError;
use crate::ports::{check_dimension, FeatureScaler, InferenceError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    /// Per-feature standard deviation. Zero entries leave the column
    /// centered but unscaled.
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit mean and population standard deviation per column.
    ///
    /// # Errors
    /// Returns `FitError` if `x` is empty or ragged.
    pub fn fit(x: &[Vec<f64>]) -> Result<Self, FitError> {
        let first = x.first().ok_or(FitError::EmptyDataset)?;
        let n_features = first.len();
        if n_features == 0 || x.iter().any(|row| row.len() != n_features) {
            return Err(FitError::RaggedRows);
        }

        let n = x.len() as f64;
        let mut mean = vec![0.0; n_features];
        for row in x {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v / n;
            }
        }

        let mut var = vec![0.0; n_features];
        for row in x {
            for ((s, v), m) in var.iter_mut().zip(row).zip(&mean) {
                *s += (v - m) * (v - m) / n;
            }
        }
        let scale = var.into_iter().map(f64::sqrt).collect();

        Ok(Self { mean, scale })
    }

    /// Number of features the scaler was fitted on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Check shapes against `n_features` and that parameters are finite.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.mean.len() != n_features || self.scale.len() != n_features {
            return Err(format!(
                "scaler has {} means and {} scales, expected {n_features}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if self
            .mean
            .iter()
            .chain(&self.scale)
            .any(|v| !v.is_finite())
        {
            return Err("scaler parameters must be finite".into());
        }
        if self.scale.iter().any(|s| *s < 0.0) {
            return Err("scaler scale must be non-negative".into());
        }
        Ok(())
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        check_dimension(features, self.mean.len())?;
        features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| {
                let s = if *s == 0.0 { 1.0 } else { *s };
                let v = (x - m) / s;
                if v.is_finite() {
                    Ok(v)
                } else {
                    Err(InferenceError::NonFinite("StandardScaler"))
                }
            })
            .collect()
    }
}
