//! Classifier trait and the serialisable set of supported models

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::logistic::LogisticRegression;
use crate::mlp::MultilayerPerceptron;

/// A fitted binary classifier producing P(VBAC | x)
pub trait ProbabilisticClassifier {
    /// Probability of the positive class for one feature row
    fn predict_proba(&self, x: &[f64]) -> Result<f64, ModelError>;

    /// Number of features the model was fitted on
    fn n_features(&self) -> usize;

    /// Short model identifier
    fn kind(&self) -> &'static str;

    /// Check that decoded parameters agree with each other before first use
    fn check_shape(&self) -> Result<(), ModelError>;

    fn predict_proba_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        rows.iter().map(|r| self.predict_proba(r)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Classifier {
    LogisticRegression(LogisticRegression),
    MultilayerPerceptron(MultilayerPerceptron),
}

impl ProbabilisticClassifier for Classifier {
    fn predict_proba(&self, x: &[f64]) -> Result<f64, ModelError> {
        match self {
            Classifier::LogisticRegression(m) => m.predict_proba(x),
            Classifier::MultilayerPerceptron(m) => m.predict_proba(x),
        }
    }

    fn n_features(&self) -> usize {
        match self {
            Classifier::LogisticRegression(m) => m.n_features(),
            Classifier::MultilayerPerceptron(m) => m.n_features(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Classifier::LogisticRegression(m) => m.kind(),
            Classifier::MultilayerPerceptron(m) => m.kind(),
        }
    }

    fn check_shape(&self) -> Result<(), ModelError> {
        match self {
            Classifier::LogisticRegression(m) => m.check_shape(),
            Classifier::MultilayerPerceptron(m) => m.check_shape(),
        }
    }
}

impl From<LogisticRegression> for Classifier {
    fn from(m: LogisticRegression) -> Self {
        Classifier::LogisticRegression(m)
    }
}

impl From<MultilayerPerceptron> for Classifier {
    fn from(m: MultilayerPerceptron) -> Self {
        Classifier::MultilayerPerceptron(m)
    }
}

/// Validate a training set and return its width
pub(crate) fn check_training_set(rows: &[Vec<f64>], labels: &[bool]) -> Result<usize, ModelError> {
    if rows.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    if rows.len() != labels.len() {
        return Err(ModelError::LengthMismatch {
            features: rows.len(),
            labels: labels.len(),
        });
    }
    let width = rows[0].len();
    if let Some(bad) = rows.iter().find(|r| r.len() != width) {
        return Err(ModelError::WidthMismatch {
            expected: width,
            found: bad.len(),
        });
    }
    if !(labels.iter().any(|&y| y) && labels.iter().any(|&y| !y)) {
        return Err(ModelError::SingleClass);
    }
    Ok(width)
}

pub(crate) fn check_width(expected: usize, x: &[f64]) -> Result<(), ModelError> {
    if x.len() != expected {
        return Err(ModelError::WidthMismatch {
            expected,
            found: x.len(),
        });
    }
    Ok(())
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
