//! Model adapters: concrete classifier families and the feature scaler.
//!
//! - `logistic`: logistic regression, consumes standardized features
//! - `forest`: random forest, consumes raw features
//! - `scaler`: standardization
//!
//! Each family can also be fitted; fitting is only used to produce
//! placeholder artifacts.

pub mod forest;
pub mod logistic;
pub mod scaler;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ports::Classifier;

pub use forest::{DecisionTree, ForestParams, RandomForest, TreeNode};
pub use logistic::{LogisticParams, LogisticRegression};
pub use scaler::StandardScaler;

/// Errors raised while fitting a model on a dataset.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("training set is empty")]
    EmptyDataset,

    #[error("training rows have inconsistent lengths")]
    RaggedRows,

    #[error("got {rows} rows but {labels} labels")]
    LabelCount { rows: usize, labels: usize },

    #[error("labels must be 0 or 1")]
    NonBinaryLabel,

    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

/// Validate a training set and return its feature count.
fn check_dataset(x: &[Vec<f64>], y: &[u8]) -> Result<usize, FitError> {
    let first = x.first().ok_or(FitError::EmptyDataset)?;
    let n_features = first.len();
    if n_features == 0 || x.iter().any(|row| row.len() != n_features) {
        return Err(FitError::RaggedRows);
    }
    if x.len() != y.len() {
        return Err(FitError::LabelCount {
            rows: x.len(),
            labels: y.len(),
        });
    }
    if y.iter().any(|&l| l > 1) {
        return Err(FitError::NonBinaryLabel);
    }
    Ok(n_features)
}

/// Parameters of a serialized classifier, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelParams {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
}

impl ModelParams {
    /// Family display name.
    #[must_use]
    pub fn family(&self) -> &'static str {
        match self {
            Self::LogisticRegression(_) => logistic::FAMILY,
            Self::RandomForest(_) => forest::FAMILY,
        }
    }

    /// Structural check against the expected feature count.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        match self {
            Self::LogisticRegression(m) => m.validate(n_features),
            Self::RandomForest(m) => m.validate(n_features),
        }
    }

    /// Turn the parameters into a shareable classifier.
    #[must_use]
    pub fn into_classifier(self) -> Arc<dyn Classifier> {
        match self {
            Self::LogisticRegression(m) => Arc::new(m),
            Self::RandomForest(m) => Arc::new(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_params_tagging() {
        let params = ModelParams::LogisticRegression(LogisticRegression::new(vec![0.5; 2], -1.0));
        let json = serde_json::to_value(&params).expect("serialize");
        assert_eq!(json["kind"], "logistic_regression");
        assert_eq!(json["intercept"], -1.0);

        let back: ModelParams = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, params);
        assert_eq!(back.family(), "LogisticRegression");
        assert_eq!(back.into_classifier().n_features(), 2);
    }

    #[test]
    fn test_check_dataset() {
        assert_eq!(check_dataset(&[], &[]), Err(FitError::EmptyDataset));
        assert_eq!(
            check_dataset(&[vec![1.0]], &[0, 1]),
            Err(FitError::LabelCount { rows: 1, labels: 2 })
        );
        assert_eq!(
            check_dataset(&[vec![1.0]], &[2]),
            Err(FitError::NonBinaryLabel)
        );
        assert_eq!(check_dataset(&[vec![1.0, 2.0]], &[1]), Ok(2));
    }
}
