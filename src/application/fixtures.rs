//! Placeholder artifact generation.
//!
//! Fits a scaler and a classifier on randomly generated rows so the
//! service can be exercised end to end. The resulting model carries no
//! clinical meaning and must never be used to assess real patients.

use std::path::PathBuf;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::adapters::artifacts::{ClassifierArtifact, ScalerArtifact};
use crate::adapters::models::{
    ForestParams, LogisticParams, LogisticRegression, ModelParams, RandomForest, StandardScaler,
};
use crate::adapters::{ArtifactBundle, ArtifactStore};
use crate::domain::{FieldKind, FEATURE_NAMES, FIELD_KINDS};
use crate::ports::FeatureScaler;

/// Which classifier family to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FixtureFamily {
    /// Random forest over raw features.
    RandomForest,
    /// Logistic regression over standardized features.
    LogisticRegression,
}

impl FixtureFamily {
    /// Whether the fitted model expects scaled input.
    #[must_use]
    pub fn requires_prescaling(self) -> bool {
        matches!(self, Self::LogisticRegression)
    }
}

#[derive(Debug, Clone)]
pub struct FixtureOptions {
    pub out_dir: PathBuf,
    pub family: FixtureFamily,
    pub seed: u64,
    pub samples: usize,
    pub trees: usize,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("models"),
            family: FixtureFamily::RandomForest,
            seed: 42,
            samples: 100,
            trees: 10,
        }
    }
}

/// What was written.
#[derive(Debug, Clone)]
pub struct FixtureSummary {
    pub out_dir: PathBuf,
    pub model_type: &'static str,
    pub requires_prescaling: bool,
    pub samples: usize,
}

/// Sampling range of a continuous field.
fn synthetic_range(name: &str) -> (f64, f64) {
    match name {
        "age" => (40.0, 95.0),
        "creatinine_phosphokinase" => (23.0, 7861.0),
        "ejection_fraction" => (14.0, 80.0),
        "platelets" => (25_100.0, 850_000.0),
        "serum_creatinine" => (0.5, 9.4),
        "serum_sodium" => (113.0, 148.0),
        "time" => (4.0, 285.0),
        _ => (0.0, 1.0),
    }
}

/// Draw `samples` rows in canonical feature order plus Bernoulli labels.
fn synthesize<R: Rng>(rng: &mut R, samples: usize) -> (Vec<Vec<f64>>, Vec<u8>) {
    let mut x = Vec::with_capacity(samples);
    let mut y = Vec::with_capacity(samples);

    for _ in 0..samples {
        let row = FEATURE_NAMES
            .iter()
            .zip(FIELD_KINDS)
            .map(|(name, kind)| match kind {
                FieldKind::Float => {
                    let (lo, hi) = synthetic_range(name);
                    rng.gen_range(lo..=hi)
                }
                FieldKind::Binary => f64::from(u8::from(rng.gen_bool(0.5))),
            })
            .collect();
        x.push(row);
        y.push(u8::from(rng.gen_bool(0.5)));
    }

    (x, y)
}

/// Fit placeholder artifacts and write them with a manifest.
///
/// # Errors
/// Returns an error if fitting fails (e.g. zero samples) or the artifact
/// directory cannot be written.
pub fn generate(options: &FixtureOptions) -> crate::Result<FixtureSummary> {
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let (x, y) = synthesize(&mut rng, options.samples);

    let scaler = StandardScaler::fit(&x)?;
    let requires_prescaling = options.family.requires_prescaling();

    let model = match options.family {
        FixtureFamily::RandomForest => {
            let params = ForestParams {
                n_trees: options.trees,
                ..ForestParams::default()
            };
            ModelParams::RandomForest(RandomForest::fit(&x, &y, &params, &mut rng)?)
        }
        FixtureFamily::LogisticRegression => {
            let scaled = x
                .iter()
                .map(|row| scaler.transform(row))
                .collect::<Result<Vec<_>, _>>()?;
            ModelParams::LogisticRegression(LogisticRegression::fit(
                &scaled,
                &y,
                &LogisticParams::default(),
            )?)
        }
    };
    let model_type = model.family();

    let bundle = ArtifactBundle {
        classifier: ClassifierArtifact::new(model, requires_prescaling),
        scaler: ScalerArtifact::new(scaler),
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
    };
    ArtifactStore::new(&options.out_dir).save(&bundle)?;

    tracing::info!(
        "Wrote placeholder {} artifacts to {:?} ({} samples, seed {})",
        model_type,
        options.out_dir,
        options.samples,
        options.seed
    );

    Ok(FixtureSummary {
        out_dir: options.out_dir.clone(),
        model_type,
        requires_prescaling,
        samples: options.samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{ModelState, ScoringOptions, ScoringService};
    use crate::domain::sample_form;
    use crate::CardioscoreError;

    fn options_in(dir: &std::path::Path, family: FixtureFamily) -> FixtureOptions {
        FixtureOptions {
            out_dir: dir.to_path_buf(),
            family,
            ..FixtureOptions::default()
        }
    }

    fn service_for(dir: &std::path::Path) -> ScoringService {
        let state = ModelState::load(&ArtifactStore::new(dir), true);
        ScoringService::new(state, ScoringOptions::default())
    }

    #[test]
    fn test_synthetic_rows_respect_kinds_and_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let (x, y) = synthesize(&mut rng, 50);
        assert_eq!(x.len(), 50);
        assert_eq!(y.len(), 50);

        for row in &x {
            for ((value, name), kind) in row.iter().zip(FEATURE_NAMES).zip(FIELD_KINDS) {
                match kind {
                    FieldKind::Binary => assert!(*value == 0.0 || *value == 1.0, "{name}"),
                    FieldKind::Float => {
                        let (lo, hi) = synthetic_range(name);
                        assert!((lo..=hi).contains(value), "{name} = {value}");
                    }
                }
            }
        }
        assert!(y.iter().all(|&l| l <= 1));
    }

    #[test]
    fn test_random_forest_fixture_scores_scenario() {
        let dir = tempfile::tempdir().expect("tempdir");
        let summary =
            generate(&options_in(dir.path(), FixtureFamily::RandomForest)).expect("generate");
        assert_eq!(summary.model_type, "RandomForestClassifier");
        assert!(!summary.requires_prescaling);

        let service = service_for(dir.path());
        assert!(service.is_ready());
        let info = service.info();
        assert_eq!(info.model_type, "RandomForestClassifier");
        assert_eq!(info.total_features, 12);
        assert_eq!(info.requires_prescaling, Some(false));

        let response = service.score(&sample_form());
        assert!(response.success, "{:?}", response.error);
        let a = response.assessment.expect("assessment");
        assert!((a.death_probability + a.survival_probability - 100.0).abs() <= 0.011);
    }

    #[test]
    fn test_logistic_fixture_requires_prescaling() {
        let dir = tempfile::tempdir().expect("tempdir");
        let summary = generate(&options_in(dir.path(), FixtureFamily::LogisticRegression))
            .expect("generate");
        assert!(summary.requires_prescaling);

        let service = service_for(dir.path());
        assert_eq!(service.info().requires_prescaling, Some(true));
        assert!(service.score(&sample_form()).success);
    }

    #[test]
    fn test_same_seed_same_classifier() {
        let a = tempfile::tempdir().expect("tempdir");
        let b = tempfile::tempdir().expect("tempdir");
        generate(&options_in(a.path(), FixtureFamily::RandomForest)).expect("generate");
        generate(&options_in(b.path(), FixtureFamily::RandomForest)).expect("generate");

        let read = |dir: &std::path::Path| {
            std::fs::read(dir.join(crate::adapters::artifacts::CLASSIFIER_FILE)).expect("read")
        };
        assert_eq!(read(a.path()), read(b.path()));
    }

    #[test]
    fn test_zero_samples_is_fit_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut options = options_in(dir.path(), FixtureFamily::RandomForest);
        options.samples = 0;
        assert!(matches!(generate(&options), Err(CardioscoreError::Fit(_))));
    }
}
