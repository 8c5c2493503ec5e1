//! Artifact store: Filesystem persistence for the classifier, scaler and
//! feature-name list.
//!
//! Layout of an artifact directory:
//!
//! ```text
//! classifier.json      {format_version, requires_prescaling, n_features, model: {kind, ...}}
//! scaler.json          {format_version, mean, scale}
//! feature_names.json   ["age", ..., "time"]
//! manifest.json        {version, created_at, files: {name: sha256}}
//! ```
//!
//! # Integrity
//!
//! When `manifest.json` is present, every file it lists must hash to the
//! recorded SHA-256 and all three artifact files must be listed. Whether a
//! manifest is mandatory is decided by the caller.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::models::{ModelParams, StandardScaler};
use crate::domain::{FEATURE_COUNT, FEATURE_NAMES};

pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const FEATURE_NAMES_FILE: &str = "feature_names.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Supported `format_version` of classifier/scaler files and `version` of
/// the manifest.
pub const FORMAT_VERSION: u32 = 1;

const ARTIFACT_FILES: [&str; 3] = [CLASSIFIER_FILE, SCALER_FILE, FEATURE_NAMES_FILE];

/// Error type for artifact operations.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact not found: {0:?}")]
    Missing(PathBuf),

    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {file} is corrupt: {source}")]
    Corrupt {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact {file} has format version {found}, expected 1")]
    VersionMismatch { file: &'static str, found: u64 },

    #[error("manifest required but not found in {0:?}")]
    ManifestRequired(PathBuf),

    #[error("manifest does not list {0}")]
    Unlisted(&'static str),

    #[error("hash mismatch for {0}")]
    HashMismatch(String),

    #[error("invalid artifact: {0}")]
    Invalid(String),
}

/// Serialized classifier plus the metadata that travels with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub format_version: u32,
    /// Display name reported by `/api/info`; must agree with `model.kind`.
    pub family: String,
    /// Whether inputs must pass through the scaler before inference.
    pub requires_prescaling: bool,
    pub n_features: usize,
    pub model: ModelParams,
}

impl ClassifierArtifact {
    #[must_use]
    pub fn new(model: ModelParams, requires_prescaling: bool) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            family: model.family().to_string(),
            requires_prescaling,
            n_features: FEATURE_COUNT,
            model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub format_version: u32,
    #[serde(flatten)]
    pub scaler: StandardScaler,
}

impl ScalerArtifact {
    #[must_use]
    pub fn new(scaler: StandardScaler) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            scaler,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    created_at: chrono::DateTime<chrono::Utc>,
    files: BTreeMap<String, String>,
}

/// The three artifacts, loaded together or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBundle {
    pub classifier: ClassifierArtifact,
    pub scaler: ScalerArtifact,
    pub feature_names: Vec<String>,
}

impl ArtifactBundle {
    /// Check versions, shapes and the canonical feature order.
    ///
    /// # Errors
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.classifier.format_version != FORMAT_VERSION {
            return Err(ArtifactError::VersionMismatch {
                file: CLASSIFIER_FILE,
                found: u64::from(self.classifier.format_version),
            });
        }
        if self.scaler.format_version != FORMAT_VERSION {
            return Err(ArtifactError::VersionMismatch {
                file: SCALER_FILE,
                found: u64::from(self.scaler.format_version),
            });
        }
        if self.feature_names.len() != FEATURE_COUNT
            || self
                .feature_names
                .iter()
                .zip(FEATURE_NAMES)
                .any(|(a, b)| a != b)
        {
            return Err(ArtifactError::Invalid(format!(
                "feature names {:?} do not match the expected order {:?}",
                self.feature_names, FEATURE_NAMES
            )));
        }
        if self.classifier.family != self.classifier.model.family() {
            return Err(ArtifactError::Invalid(format!(
                "classifier family {} does not match its parameters ({})",
                self.classifier.family,
                self.classifier.model.family()
            )));
        }
        if self.classifier.n_features != FEATURE_COUNT {
            return Err(ArtifactError::Invalid(format!(
                "classifier declares {} features, expected {FEATURE_COUNT}",
                self.classifier.n_features
            )));
        }
        self.classifier
            .model
            .validate(FEATURE_COUNT)
            .map_err(ArtifactError::Invalid)?;
        self.scaler
            .scaler
            .validate(FEATURE_COUNT)
            .map_err(ArtifactError::Invalid)?;
        Ok(())
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Directory-backed artifact store.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_bytes(&self, file: &str) -> Result<Vec<u8>, ArtifactError> {
        let path = self.dir.join(file);
        fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ArtifactError::Missing(path)
            } else {
                ArtifactError::Io { path, source }
            }
        })
    }

    fn write_bytes(&self, file: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
        let path = self.dir.join(file);
        fs::write(&path, bytes).map_err(|source| ArtifactError::Io { path, source })
    }

    /// Parse a versioned file, checking `format_version` before the rest of
    /// the schema so a newer layout reports as a version mismatch.
    fn read_versioned<T: DeserializeOwned>(&self, file: &'static str) -> Result<T, ArtifactError> {
        let bytes = self.read_bytes(file)?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|source| ArtifactError::Corrupt { file, source })?;

        let found = value
            .get("format_version")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0);
        if found != u64::from(FORMAT_VERSION) {
            return Err(ArtifactError::VersionMismatch { file, found });
        }

        serde_json::from_value(value).map_err(|source| ArtifactError::Corrupt { file, source })
    }

    fn verify_manifest(&self, require_manifest: bool) -> Result<(), ArtifactError> {
        let path = self.dir.join(MANIFEST_FILE);
        if !path.exists() {
            if require_manifest {
                return Err(ArtifactError::ManifestRequired(self.dir.clone()));
            }
            tracing::warn!("No {MANIFEST_FILE} in {:?}; artifact hashes not verified", self.dir);
            return Ok(());
        }

        let bytes = self.read_bytes(MANIFEST_FILE)?;
        let manifest: Manifest = serde_json::from_slice(&bytes).map_err(|source| {
            ArtifactError::Corrupt {
                file: MANIFEST_FILE,
                source,
            }
        })?;
        if manifest.version != FORMAT_VERSION {
            return Err(ArtifactError::VersionMismatch {
                file: MANIFEST_FILE,
                found: u64::from(manifest.version),
            });
        }

        for file in ARTIFACT_FILES {
            if !manifest.files.contains_key(file) {
                return Err(ArtifactError::Unlisted(file));
            }
        }

        for (rel, expected) in &manifest.files {
            if Path::new(rel).components().count() != 1 {
                return Err(ArtifactError::Invalid(format!(
                    "manifest entry {rel:?} must be a plain file name"
                )));
            }
            let actual = sha256_hex(&self.read_bytes(rel)?);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(ArtifactError::HashMismatch(rel.clone()));
            }
        }

        tracing::info!(
            "Artifact hashes verified against manifest created {}",
            manifest.created_at
        );
        Ok(())
    }

    /// Load and validate all three artifacts.
    ///
    /// # Errors
    /// Returns `ArtifactError` if any artifact is missing, corrupt, of the
    /// wrong version, fails its manifest hash, or is inconsistent with the
    /// canonical feature layout.
    pub fn load(&self, require_manifest: bool) -> Result<ArtifactBundle, ArtifactError> {
        self.verify_manifest(require_manifest)?;

        let classifier: ClassifierArtifact = self.read_versioned(CLASSIFIER_FILE)?;
        let scaler: ScalerArtifact = self.read_versioned(SCALER_FILE)?;
        let feature_names: Vec<String> = serde_json::from_slice(
            &self.read_bytes(FEATURE_NAMES_FILE)?,
        )
        .map_err(|source| ArtifactError::Corrupt {
            file: FEATURE_NAMES_FILE,
            source,
        })?;

        let bundle = ArtifactBundle {
            classifier,
            scaler,
            feature_names,
        };
        bundle.validate()?;

        tracing::info!(
            "Loaded artifacts from {:?} (family={}, requires_prescaling={}, n_features={})",
            self.dir,
            bundle.classifier.model.family(),
            bundle.classifier.requires_prescaling,
            bundle.feature_names.len()
        );
        Ok(bundle)
    }

    /// Write all three artifacts and a manifest binding their hashes.
    ///
    /// # Errors
    /// Returns `ArtifactError` if the bundle is invalid or a write fails.
    pub fn save(&self, bundle: &ArtifactBundle) -> Result<(), ArtifactError> {
        bundle.validate()?;
        fs::create_dir_all(&self.dir).map_err(|source| ArtifactError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let to_json = |file: &'static str, value: serde_json::Result<Vec<u8>>| {
            value.map_err(|source| ArtifactError::Corrupt { file, source })
        };
        let contents = [
            (
                CLASSIFIER_FILE,
                to_json(CLASSIFIER_FILE, serde_json::to_vec_pretty(&bundle.classifier))?,
            ),
            (
                SCALER_FILE,
                to_json(SCALER_FILE, serde_json::to_vec_pretty(&bundle.scaler))?,
            ),
            (
                FEATURE_NAMES_FILE,
                to_json(
                    FEATURE_NAMES_FILE,
                    serde_json::to_vec_pretty(&bundle.feature_names),
                )?,
            ),
        ];

        let mut files = BTreeMap::new();
        for (file, bytes) in &contents {
            self.write_bytes(file, bytes)?;
            files.insert((*file).to_string(), sha256_hex(bytes));
        }

        let manifest = Manifest {
            version: FORMAT_VERSION,
            created_at: chrono::Utc::now(),
            files,
        };
        let manifest_bytes = to_json(MANIFEST_FILE, serde_json::to_vec_pretty(&manifest))?;
        self.write_bytes(MANIFEST_FILE, &manifest_bytes)?;

        tracing::info!("Wrote artifacts and manifest to {:?}", self.dir);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::models::LogisticRegression;

    fn sample_bundle() -> ArtifactBundle {
        ArtifactBundle {
            classifier: ClassifierArtifact::new(
                ModelParams::LogisticRegression(LogisticRegression::new(
                    vec![0.1; FEATURE_COUNT],
                    -0.5,
                )),
                true,
            ),
            scaler: ScalerArtifact::new(StandardScaler {
                mean: vec![0.0; FEATURE_COUNT],
                scale: vec![1.0; FEATURE_COUNT],
            }),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        let bundle = sample_bundle();

        store.save(&bundle).expect("save");
        assert!(dir.path().join(MANIFEST_FILE).exists());

        let loaded = store.load(true).expect("load");
        assert_eq!(loaded, bundle);
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path().join("absent"));
        assert!(matches!(store.load(false), Err(ArtifactError::Missing(_))));
        assert!(matches!(
            store.load(true),
            Err(ArtifactError::ManifestRequired(_))
        ));
    }

    #[test]
    fn test_tampered_file_fails_hash() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        store.save(&sample_bundle()).expect("save");

        let path = dir.path().join(CLASSIFIER_FILE);
        let tampered = fs::read_to_string(&path)
            .expect("read")
            .replace("-0.5", "-0.25");
        fs::write(&path, tampered).expect("write");

        assert!(matches!(
            store.load(false),
            Err(ArtifactError::HashMismatch(f)) if f == CLASSIFIER_FILE
        ));
    }

    #[test]
    fn test_unverified_load_without_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        store.save(&sample_bundle()).expect("save");
        fs::remove_file(dir.path().join(MANIFEST_FILE)).expect("remove");

        assert!(store.load(false).is_ok());
        assert!(store.load(true).is_err());
    }

    #[test]
    fn test_version_mismatch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        store.save(&sample_bundle()).expect("save");
        fs::remove_file(dir.path().join(MANIFEST_FILE)).expect("remove");

        fs::write(
            dir.path().join(SCALER_FILE),
            r#"{"format_version": 2, "center": []}"#,
        )
        .expect("write");

        assert!(matches!(
            store.load(false),
            Err(ArtifactError::VersionMismatch { file, found: 2 }) if file == SCALER_FILE
        ));
    }

    #[test]
    fn test_corrupt_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path());
        store.save(&sample_bundle()).expect("save");
        fs::remove_file(dir.path().join(MANIFEST_FILE)).expect("remove");
        fs::write(dir.path().join(FEATURE_NAMES_FILE), b"not json").expect("write");

        assert!(matches!(
            store.load(false),
            Err(ArtifactError::Corrupt { file, .. }) if file == FEATURE_NAMES_FILE
        ));
    }

    #[test]
    fn test_feature_order_is_enforced() {
        let mut bundle = sample_bundle();
        bundle.feature_names.swap(0, 1);
        assert!(matches!(bundle.validate(), Err(ArtifactError::Invalid(_))));

        let mut short = sample_bundle();
        short.feature_names.pop();
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_model_shape_is_enforced() {
        let mut bundle = sample_bundle();
        bundle.classifier.model =
            ModelParams::LogisticRegression(LogisticRegression::new(vec![0.1; 3], 0.0));
        assert!(matches!(bundle.validate(), Err(ArtifactError::Invalid(_))));

        let dir = tempfile::tempdir().expect("tempdir");
        assert!(ArtifactStore::new(dir.path()).save(&bundle).is_err());
    }

    #[test]
    fn test_family_must_match_parameters() {
        let mut bundle = sample_bundle();
        bundle.classifier.family = "RandomForestClassifier".into();
        assert!(matches!(bundle.validate(), Err(ArtifactError::Invalid(_))));
    }
}
