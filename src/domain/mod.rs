//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O. Everything here is deterministic and
//! can be tested without artifacts.

mod assessment;
mod features;
mod risk;

pub use assessment::{round2, Assessment, LABEL_DEATH_EVENT, LABEL_SURVIVAL};
pub use features::{
    ClinicalFeatures, FeatureError, FieldKind, FEATURE_COUNT, FEATURE_NAMES, FIELD_KINDS,
};
pub use risk::{risk_level, ColorTag, RiskLevel};

#[cfg(test)]
pub(crate) use features::sample_form;
