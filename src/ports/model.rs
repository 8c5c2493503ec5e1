//! Model port: Traits for the opaque classifier and scaler artifacts.
//!
//! The scoring core only ever talks to these traits. Concrete model
//! families live in `adapters::models` and are selected by the artifact
//! loader.

/// Errors raised by a classifier or scaler during inference.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("feature count mismatch: got {got}, expected {expected}")]
    DimensionMismatch { got: usize, expected: usize },

    #[error("non-finite value produced by {0}")]
    NonFinite(&'static str),

    #[error("malformed model: {0}")]
    Malformed(String),

    #[error("classifier returned an invalid probability distribution: [{0}, {1}]")]
    InvalidDistribution(f64, f64),

    #[error("classifier returned unknown label {0}")]
    UnknownLabel(u8),

    #[error("model raised a fault: {0}")]
    Panicked(String),
}

/// A fitted binary classifier.
///
/// Implementations must be read-only after construction; a single instance
/// is shared by all concurrent requests.
pub trait Classifier: Send + Sync {
    /// Family display name (e.g. `RandomForestClassifier`).
    fn family(&self) -> &str;

    /// Number of features the classifier was fitted on.
    fn n_features(&self) -> usize;

    /// Predict the class label (0 = survival, 1 = death event).
    ///
    /// # Errors
    /// Returns `InferenceError` if the input has the wrong shape or the
    /// model is malformed.
    fn predict(&self, features: &[f64]) -> Result<u8, InferenceError>;

    /// Predict `[p_class0, p_class1]`.
    ///
    /// # Errors
    /// Returns `InferenceError` if the input has the wrong shape or the
    /// model is malformed.
    fn predict_probability(&self, features: &[f64]) -> Result<[f64; 2], InferenceError>;
}

/// A fitted feature scaler.
pub trait FeatureScaler: Send + Sync {
    /// Rescale one feature vector.
    ///
    /// # Errors
    /// Returns `InferenceError` if the input has the wrong shape.
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError>;
}

/// Shared shape check for implementers.
///
/// # Errors
/// Returns `InferenceError::DimensionMismatch` when lengths differ.
pub fn check_dimension(features: &[f64], expected: usize) -> Result<(), InferenceError> {
    if features.len() == expected {
        Ok(())
    } else {
        Err(InferenceError::DimensionMismatch {
            got: features.len(),
            expected,
        })
    }
}
