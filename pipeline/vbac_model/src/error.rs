//! Errors for fitting, prediction and artifact persistence

use thiserror::Error;
use vbac_features::ManifestError;

/// Errors that can occur while fitting or applying a classifier
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Training set is empty")]
    EmptyTrainingSet,
    #[error("{features} feature rows but {labels} labels")]
    LengthMismatch { features: usize, labels: usize },
    #[error("Expected {expected} features, got {found}")]
    WidthMismatch { expected: usize, found: usize },
    #[error("Training labels contain a single class")]
    SingleClass,
    #[error("The {side} split does not contain both outcome classes")]
    SplitMissingClass { side: &'static str },
    #[error("Invalid training option: {0}")]
    InvalidOption(String),
    #[error("Training diverged: parameters are no longer finite")]
    Diverged,
    #[error("Malformed classifier parameters: {0}")]
    MalformedParameters(String),
}

/// Errors that can occur while saving or loading a model artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Artifact is corrupt or incomplete: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Unsupported artifact format version {found} (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },
    #[error("Classifier expects {classifier} features but the manifest has {manifest}")]
    WidthMismatch { classifier: usize, manifest: usize },
    #[error("Manifest does not match the schema registry: {0}")]
    Manifest(#[from] ManifestError),
    #[error("Artifact classifier is unusable: {0}")]
    Classifier(#[from] ModelError),
}
