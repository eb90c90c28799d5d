//! Classifiers, training, persisted model artifacts and risk tiering for VBAC prediction.
//!
//! The artifact pairs a fitted [`Classifier`] with the [`FeatureManifest`] its
//! inputs were laid out by; both are saved and loaded together.
//!
//! [`FeatureManifest`]: vbac_features::FeatureManifest

pub mod artifact;
pub mod classifier;
pub mod error;
pub mod logistic;
pub mod metrics;
pub mod mlp;
pub mod risk;
pub mod scaler;
pub mod split;
pub mod training;

pub use artifact::{ArtifactMetadata, ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use classifier::{Classifier, ProbabilisticClassifier};
pub use error::{ArtifactError, ModelError};
pub use logistic::{LogisticOptions, LogisticRegression};
pub use mlp::{MlpOptions, MultilayerPerceptron};
pub use risk::{
    Assessment, RiskTier, LOW_RISK_MIN_PROBABILITY, MEDIUM_RISK_MIN_PROBABILITY,
};
pub use training::{train, ClassifierKind, Evaluation, TrainingOptions, TrainingOutcome};
