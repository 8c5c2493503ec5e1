//! Scoring service: Turns submitted form values into a risk assessment.
//!
//! This service coordinates:
//! - Field extraction and type conversion
//! - Optional range validation
//! - Conditional pre-scaling
//! - Classifier invocation
//! - Risk bucketing
//!
//! Every failure is returned as a value. A [`ScoreResponse`] with
//! `success: false` is the only way a request can fail.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;

use crate::adapters::{ArtifactBundle, ArtifactStore};
use crate::domain::{Assessment, ClinicalFeatures, FeatureError, LABEL_DEATH_EVENT};
use crate::ports::{check_dimension, Classifier, FeatureScaler, InferenceError};

const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Error type for a single scoring request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("model not loaded")]
    ModelUnavailable,

    #[error("Prediction error: {0}")]
    InvalidInput(#[from] FeatureError),

    #[error("Prediction error: values out of range: {}", .0.join("; "))]
    OutOfRange(Vec<String>),

    #[error("Prediction error: {0}")]
    Inference(#[from] InferenceError),
}

/// Loaded artifacts, immutable once built.
pub struct ModelContext {
    classifier: Arc<dyn Classifier>,
    scaler: Arc<dyn FeatureScaler>,
    feature_names: Vec<String>,
    requires_prescaling: bool,
    loaded_at: chrono::DateTime<chrono::Utc>,
}

impl ModelContext {
    #[must_use]
    pub fn new(
        classifier: Arc<dyn Classifier>,
        scaler: Arc<dyn FeatureScaler>,
        feature_names: Vec<String>,
        requires_prescaling: bool,
    ) -> Self {
        Self {
            classifier,
            scaler,
            feature_names,
            requires_prescaling,
            loaded_at: chrono::Utc::now(),
        }
    }

    /// Build a context from a validated artifact bundle.
    #[must_use]
    pub fn from_bundle(bundle: ArtifactBundle) -> Self {
        Self::new(
            bundle.classifier.model.into_classifier(),
            Arc::new(bundle.scaler.scaler),
            bundle.feature_names,
            bundle.classifier.requires_prescaling,
        )
    }

    #[must_use]
    pub fn family(&self) -> &str {
        self.classifier.family()
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn requires_prescaling(&self) -> bool {
        self.requires_prescaling
    }

    fn infer(&self, features: &ClinicalFeatures) -> Result<Assessment, InferenceError> {
        let raw = features.to_vec();
        let input = if self.requires_prescaling {
            self.scaler.transform(&raw)?
        } else {
            raw
        };
        check_dimension(&input, self.classifier.n_features())?;

        let label = self.classifier.predict(&input)?;
        let probabilities = self.classifier.predict_probability(&input)?;

        if label > LABEL_DEATH_EVENT {
            return Err(InferenceError::UnknownLabel(label));
        }
        let [p0, p1] = probabilities;
        let in_unit = |p: f64| p.is_finite() && (0.0..=1.0).contains(&p);
        if !in_unit(p0) || !in_unit(p1) || (p0 + p1 - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(InferenceError::InvalidDistribution(p0, p1));
        }

        Ok(Assessment::new(label, probabilities))
    }
}

/// Readiness of the process-wide artifacts.
pub enum ModelState {
    Ready(ModelContext),
    Unavailable { reason: String },
}

impl ModelState {
    /// Load artifacts once. Failure is logged and yields `Unavailable`;
    /// it never aborts the process.
    #[must_use]
    pub fn load(store: &ArtifactStore, require_manifest: bool) -> Self {
        tracing::info!("Loading model artifacts from {:?}...", store.dir());
        match store.load(require_manifest) {
            Ok(bundle) => {
                let ctx = ModelContext::from_bundle(bundle);
                tracing::info!(
                    "Model ready: type={}, features={}",
                    ctx.family(),
                    ctx.feature_names().len()
                );
                Self::Ready(ctx)
            }
            Err(e) => {
                tracing::error!("Failed to load model artifacts: {e}");
                tracing::warn!("Scoring disabled; info and landing endpoints remain available");
                Self::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Scoring behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringOptions {
    /// Reject physiologically implausible inputs.
    pub range_validation: bool,
}

/// Response body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResponse {
    pub success: bool,

    #[serde(flatten)]
    pub assessment: Option<Assessment>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<Assessment, ScoringError>> for ScoreResponse {
    fn from(result: Result<Assessment, ScoringError>) -> Self {
        match result {
            Ok(assessment) => Self {
                success: true,
                assessment: Some(assessment),
                error: None,
            },
            Err(e) => Self {
                success: false,
                assessment: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Response body of `GET /api/info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub features: Vec<String>,
    pub total_features: usize,
    pub status: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_prescaling: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<chrono::DateTime<chrono::Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Service for scoring requests against the loaded artifacts.
pub struct ScoringService {
    state: ModelState,
    options: ScoringOptions,
}

impl ScoringService {
    /// Create a new scoring service.
    #[must_use]
    pub fn new(state: ModelState, options: ScoringOptions) -> Self {
        Self { state, options }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    /// Score one submission.
    ///
    /// # Errors
    /// Returns `ScoringError` if the model is unavailable, the input is
    /// malformed or out of range, or inference fails.
    pub fn try_score(&self, form: &HashMap<String, String>) -> Result<Assessment, ScoringError> {
        let ctx = match &self.state {
            ModelState::Ready(ctx) => ctx,
            ModelState::Unavailable { reason } => {
                tracing::debug!("Scoring unavailable: {reason}");
                return Err(ScoringError::ModelUnavailable);
            }
        };

        let features = ClinicalFeatures::from_form(form)?;
        if self.options.range_validation {
            features.validate().map_err(ScoringError::OutOfRange)?;
        }

        // Artifact implementations are opaque; a fault inside one is
        // reported like any other inference failure.
        let assessment = panic::catch_unwind(AssertUnwindSafe(|| ctx.infer(&features)))
            .map_err(|payload| InferenceError::Panicked(panic_message(payload.as_ref())))??;

        tracing::debug!(
            "Scored request: prediction={}, death_probability={:.2}%, risk={}",
            assessment.prediction,
            assessment.death_probability,
            assessment.risk_level
        );
        Ok(assessment)
    }

    /// Score one submission and fold any failure into the response.
    #[must_use]
    pub fn score(&self, form: &HashMap<String, String>) -> ScoreResponse {
        let result = self.try_score(form);
        if let Err(e) = &result {
            tracing::warn!("Scoring request failed: {e}");
        }
        result.into()
    }

    /// Read-only snapshot of the loaded model.
    #[must_use]
    pub fn info(&self) -> ModelInfo {
        match &self.state {
            ModelState::Ready(ctx) => ModelInfo {
                model_type: ctx.family().to_string(),
                features: ctx.feature_names().to_vec(),
                total_features: ctx.feature_names().len(),
                status: "ready",
                requires_prescaling: Some(ctx.requires_prescaling()),
                loaded_at: Some(ctx.loaded_at),
                error: None,
            },
            ModelState::Unavailable { .. } => ModelInfo {
                model_type: "not loaded".to_string(),
                features: Vec::new(),
                total_features: 0,
                status: "not loaded",
                requires_prescaling: None,
                loaded_at: None,
                error: Some("Model not loaded".to_string()),
            },
        }
    }
}
