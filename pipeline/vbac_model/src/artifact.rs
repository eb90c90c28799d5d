//! The trained classifier and its feature manifest, persisted as one document.
//!
//! Neither half is usable alone: a classifier without its manifest has no
//! defined input layout, so [`ModelArtifact::load`] rejects a document missing
//! either part, and construction rejects a classifier whose width differs from
//! the manifest. Decoding also runs the manifest layout checks and the
//! classifier's own shape checks, so a corrupt document fails at load time.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use vbac_features::{FeatureManifest, FeatureVector, OnlineEncoder};
use vbac_schema::SchemaRegistry;

use crate::classifier::{Classifier, ProbabilisticClassifier};
use crate::error::{ArtifactError, ModelError};
use crate::risk::Assessment;
use crate::training::Evaluation;

/// Bumped whenever the persisted layout changes incompatibly
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub format_version: u32,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    pub classifier: String,
    /// Rows in the encoded batch, before the train/test split
    pub training_rows: usize,
    pub evaluation: Evaluation,
}

impl ArtifactMetadata {
    pub fn new(classifier: &str, training_rows: usize, evaluation: Evaluation) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            created_at: chrono::Utc::now().to_rfc3339(),
            classifier: classifier.to_string(),
            training_rows,
            evaluation,
        }
    }
}

/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    metadata: ArtifactMetadata,
    classifier: Classifier,
    manifest: FeatureManifest,
}

impl ModelArtifact {
    pub fn new(
        metadata: ArtifactMetadata,
        classifier: Classifier,
        manifest: FeatureManifest,
    ) -> Result<Self, ModelError> {
        if classifier.n_features() != manifest.len() {
            return Err(ModelError::WidthMismatch {
                expected: manifest.len(),
                found: classifier.n_features(),
            });
        }
        Ok(Self {
            metadata,
            classifier,
            manifest,
        })
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn manifest(&self) -> &FeatureManifest {
        &self.manifest
    }

    /// An online encoder laid out by this artifact's manifest
    pub fn encoder(&self) -> OnlineEncoder<'_> {
        OnlineEncoder::new(&self.manifest)
    }

    /// Write the artifact as pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Saved model artifact to {}", path.display());
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let artifact: Self = serde_json::from_str(json)?;
        if artifact.metadata.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedFormat {
                found: artifact.metadata.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }
        artifact.classifier.check_shape()?;
        if artifact.classifier.n_features() != artifact.manifest.len() {
            return Err(ArtifactError::WidthMismatch {
                classifier: artifact.classifier.n_features(),
                manifest: artifact.manifest.len(),
            });
        }
        Ok(artifact)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let artifact = Self::from_json(&json)?;
        log::info!(
            "Loaded {} artifact from {} ({} features, schema {})",
            artifact.metadata.classifier,
            path.display(),
            artifact.manifest.len(),
            artifact.manifest.schema_version()
        );
        Ok(artifact)
    }

    /// [`load`](Self::load), then check the manifest against `registry`
    pub fn load_validated(
        path: impl AsRef<Path>,
        registry: &SchemaRegistry,
    ) -> Result<Self, ArtifactError> {
        let artifact = Self::load(path)?;
        artifact.manifest.validate_against(registry)?;
        Ok(artifact)
    }

    /// P(VBAC) for a vector produced against this artifact's manifest
    pub fn predict(&self, vector: &FeatureVector) -> Result<f64, ModelError> {
        if vector.len() != self.manifest.len() {
            return Err(ModelError::WidthMismatch {
                expected: self.manifest.len(),
                found: vector.len(),
            });
        }
        self.classifier.predict_proba(vector.as_slice())
    }

    pub fn assess(&self, vector: &FeatureVector) -> Result<Assessment, ModelError> {
        self.predict(vector).map(Assessment::from_probability)
    }
}
