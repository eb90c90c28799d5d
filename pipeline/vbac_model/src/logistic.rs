//! Multivariate logistic regression fitted by batch gradient descent

use serde::{Deserialize, Serialize};

use crate::classifier::{check_training_set, check_width, sigmoid, ProbabilisticClassifier};
use crate::error::ModelError;
use crate::scaler::Standardizer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogisticOptions {
    pub learning_rate: f64,
    pub epochs: usize,
    /// L2 penalty on weights (not the intercept)
    pub l2: f64,
}

impl Default for LogisticOptions {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 500,
            l2: 1e-4,
        }
    }
}

impl LogisticOptions {
    fn validate(&self) -> Result<(), ModelError> {
        if !(self.learning_rate > 0.0) || self.epochs == 0 || !(self.l2 >= 0.0) {
            return Err(ModelError::InvalidOption(format!(
                "logistic: learning_rate must be > 0, epochs > 0, l2 >= 0 (got {}, {}, {})",
                self.learning_rate, self.epochs, self.l2
            )));
        }
        Ok(())
    }
}

/// Inputs are standardised internally; callers pass raw manifest-ordered rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    scaler: Standardizer,
    weights: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[bool],
        options: &LogisticOptions,
    ) -> Result<Self, ModelError> {
        options.validate()?;
        let width = check_training_set(rows, labels)?;
        let scaler = Standardizer::fit(rows);
        let xs = scaler.transform_batch(rows);
        let n = xs.len() as f64;

        let mut w = vec![0.0; width];
        let mut b = 0.0;
        for epoch in 0..options.epochs {
            let mut grad_w = vec![0.0; width];
            let mut grad_b = 0.0;
            let mut loss = 0.0;
            for (x, &y) in xs.iter().zip(labels) {
                let y_num = if y { 1.0 } else { 0.0 };
                let p = sigmoid(dot(&w, x) + b);
                let diff = p - y_num;
                for (g, &xi) in grad_w.iter_mut().zip(x) {
                    *g += diff * xi;
                }
                grad_b += diff;
                loss -= y_num * p.max(1e-12).ln() + (1.0 - y_num) * (1.0 - p).max(1e-12).ln();
            }
            for (wi, g) in w.iter_mut().zip(&grad_w) {
                *wi -= options.learning_rate * (g / n + options.l2 * *wi);
            }
            b -= options.learning_rate * grad_b / n;

            if epoch % 100 == 0 {
                log::debug!("logistic epoch {epoch}: mean log-loss {:.5}", loss / n);
            }
        }

        if !b.is_finite() || w.iter().any(|x| !x.is_finite()) {
            return Err(ModelError::Diverged);
        }
        Ok(Self {
            scaler,
            weights: w,
            intercept: b,
        })
    }

    /// Coefficients on the standardised scale, manifest order
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn predict_proba(&self, x: &[f64]) -> Result<f64, ModelError> {
        check_width(self.weights.len(), x)?;
        let z = self.scaler.transform(x);
        Ok(sigmoid(dot(&self.weights, &z) + self.intercept))
    }

    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn check_shape(&self) -> Result<(), ModelError> {
        self.scaler.check_shape()?;
        if self.scaler.width() != self.weights.len() {
            return Err(ModelError::MalformedParameters(format!(
                "scaler width {} but {} weights",
                self.scaler.width(),
                self.weights.len()
            )));
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(ModelError::MalformedParameters("non-finite weights".into()));
        }
        Ok(())
    }
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<bool>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let x = i as f64;
            rows.push(vec![x, (i % 3) as f64]);
            labels.push(x >= 20.0);
        }
        (rows, labels)
    }

    #[test]
    fn learns_a_threshold() {
        let (rows, labels) = separable();
        let model = LogisticRegression::fit(&rows, &labels, &LogisticOptions::default()).unwrap();
        assert_eq!(model.n_features(), 2);
        assert!(model.predict_proba(&[35.0, 1.0]).unwrap() > 0.9);
        assert!(model.predict_proba(&[3.0, 1.0]).unwrap() < 0.1);
        assert!(model.weights()[0] > 0.0);
    }

    #[test]
    fn wrong_width_is_an_error() {
        let (rows, labels) = separable();
        let model = LogisticRegression::fit(&rows, &labels, &LogisticOptions::default()).unwrap();
        assert_eq!(
            model.predict_proba(&[1.0]),
            Err(ModelError::WidthMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn invalid_options_rejected() {
        let (rows, labels) = separable();
        let opts = LogisticOptions {
            epochs: 0,
            ..LogisticOptions::default()
        };
        assert!(matches!(
            LogisticRegression::fit(&rows, &labels, &opts),
            Err(ModelError::InvalidOption(_))
        ));
    }
}
