//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the scoring core and the loaded model artifacts.

mod model;

pub use model::{check_dimension, Classifier, FeatureScaler, InferenceError};
