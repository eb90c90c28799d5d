use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Per-column standardisation fitted on training rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Standardizer {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if rows.is_empty() {
            return Self {
                mean: vec![0.0; width],
                std: vec![0.0; width],
            };
        }
        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, &x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        for m in &mut mean {
            *m /= n;
        }
        let mut var = vec![0.0; width];
        for row in rows {
            for ((v, &m), &x) in var.iter_mut().zip(&mean).zip(row) {
                let d = x - m;
                *v += d * d;
            }
        }
        let std = var.into_iter().map(|v| (v / n).sqrt()).collect();
        Self { mean, std }
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// One finite mean and non-negative std per column
    pub fn check_shape(&self) -> Result<(), ModelError> {
        if self.mean.len() != self.std.len() {
            return Err(ModelError::MalformedParameters(format!(
                "scaler has {} means but {} deviations",
                self.mean.len(),
                self.std.len()
            )));
        }
        let finite = self.mean.iter().all(|m| m.is_finite())
            && self.std.iter().all(|s| s.is_finite() && *s >= 0.0);
        if !finite {
            return Err(ModelError::MalformedParameters(
                "scaler contains non-finite or negative values".into(),
            ));
        }
        Ok(())
    }

    /// Zero-variance columns map to 0.0
    pub fn transform(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(&x, (&m, &s))| if s == 0.0 { 0.0 } else { (x - m) / s })
            .collect()
    }

    pub fn transform_batch(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}
