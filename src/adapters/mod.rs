//! Adapters layer: Concrete implementations of ports.
//!
//! - `models`: classifier families and the feature scaler
//! - `artifacts`: filesystem artifact store with hash manifest
//! - `sanitize`: clinical value filtering for logs

pub mod artifacts;
pub mod models;
pub mod sanitize;

pub use artifacts::{ArtifactBundle, ArtifactError, ArtifactStore};
