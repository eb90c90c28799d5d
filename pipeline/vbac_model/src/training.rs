//! Fit a classifier on an encoded design matrix and evaluate it on a held-out split

use serde::{Deserialize, Serialize};
use vbac_features::DesignMatrix;

use crate::artifact::{ArtifactMetadata, ModelArtifact};
use crate::classifier::{Classifier, ProbabilisticClassifier};
use crate::error::ModelError;
use crate::logistic::{LogisticOptions, LogisticRegression};
use crate::metrics::{brier_score, confusion_matrix, roc_auc};
use crate::mlp::{MlpOptions, MultilayerPerceptron};
use crate::split::{gather, stratified_split};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    Logistic,
    Mlp,
}

impl std::str::FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logistic" => Ok(ClassifierKind::Logistic),
            "mlp" => Ok(ClassifierKind::Mlp),
            other => Err(format!("unknown classifier '{other}' (expected logistic or mlp)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingOptions {
    pub classifier: ClassifierKind,
    /// Share of rows held out for evaluation
    pub test_fraction: f64,
    pub seed: u64,
    pub logistic: LogisticOptions,
    pub mlp: MlpOptions,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            classifier: ClassifierKind::default(),
            test_fraction: 0.3,
            seed: 123,
            logistic: LogisticOptions::default(),
            mlp: MlpOptions::default(),
        }
    }
}

/// Held-out performance of a fitted classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub train_rows: usize,
    pub test_rows: usize,
    pub auroc: f64,
    pub brier: f64,
    /// Accuracy at a 0.5 cut
    pub accuracy: f64,
    /// Share of VBAC outcomes in the test split
    pub test_positive_rate: f64,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub evaluation: Evaluation,
}

pub fn train(design: &DesignMatrix, options: &TrainingOptions) -> Result<TrainingOutcome, ModelError> {
    let split = stratified_split(&design.outcome, options.test_fraction, options.seed)?;
    let x_train = gather(&design.rows, &split.train);
    let y_train = gather(&design.outcome, &split.train);
    let x_test = gather(&design.rows, &split.test);
    let y_test = gather(&design.outcome, &split.test);

    for (side, labels) in [("training", &y_train), ("test", &y_test)] {
        if !(labels.iter().any(|&y| y) && labels.iter().any(|&y| !y)) {
            return Err(ModelError::SplitMissingClass { side });
        }
    }

    log::info!(
        "Fitting {:?} on {} rows x {} features ({} held out)",
        options.classifier,
        x_train.len(),
        design.n_features(),
        x_test.len()
    );
    let classifier: Classifier = match options.classifier {
        ClassifierKind::Logistic => {
            LogisticRegression::fit(&x_train, &y_train, &options.logistic)?.into()
        }
        ClassifierKind::Mlp => MultilayerPerceptron::fit(&x_train, &y_train, &options.mlp)?.into(),
    };

    let scores = classifier.predict_proba_batch(&x_test)?;
    let positives = y_test.iter().filter(|&&y| y).count();
    let evaluation = Evaluation {
        train_rows: x_train.len(),
        test_rows: x_test.len(),
        auroc: roc_auc(&y_test, &scores),
        brier: brier_score(&y_test, &scores),
        accuracy: confusion_matrix(&y_test, &scores, 0.5).accuracy(),
        test_positive_rate: positives as f64 / y_test.len() as f64,
    };
    log::info!(
        "Held-out AUROC {:.4}, Brier {:.4}, accuracy {:.4}",
        evaluation.auroc,
        evaluation.brier,
        evaluation.accuracy
    );

    let metadata = ArtifactMetadata::new(classifier.kind(), design.n_rows(), evaluation.clone());
    let artifact = ModelArtifact::new(metadata, classifier, design.manifest.clone())?;
    Ok(TrainingOutcome {
        artifact,
        evaluation,
    })
}
