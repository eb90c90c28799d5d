//! Feed-forward network with leaky ReLU hidden layers and a sigmoid output

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::classifier::{check_training_set, check_width, sigmoid, ProbabilisticClassifier};
use crate::error::ModelError;
use crate::logistic::dot;
use crate::scaler::Standardizer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MlpOptions {
    pub hidden_layers: Vec<usize>,
    pub learning_rate: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub l2: f64,
    pub leaky_slope: f64,
    /// Weight each class inversely to its frequency
    pub balanced_class_weights: bool,
    pub seed: u64,
}

impl Default for MlpOptions {
    fn default() -> Self {
        Self {
            hidden_layers: vec![32, 16],
            learning_rate: 0.01,
            epochs: 60,
            batch_size: 256,
            l2: 1e-4,
            leaky_slope: 0.01,
            balanced_class_weights: true,
            seed: 123,
        }
    }
}

impl MlpOptions {
    fn validate(&self) -> Result<(), ModelError> {
        if self.hidden_layers.iter().any(|&n| n == 0) {
            return Err(ModelError::InvalidOption(
                "mlp: hidden layer sizes must be positive".into(),
            ));
        }
        if !(self.learning_rate > 0.0) || self.epochs == 0 || self.batch_size == 0 {
            return Err(ModelError::InvalidOption(
                "mlp: learning_rate, epochs and batch_size must be positive".into(),
            ));
        }
        if !(self.l2 >= 0.0) || !(0.0..1.0).contains(&self.leaky_slope) {
            return Err(ModelError::InvalidOption(format!(
                "mlp: l2 must be >= 0 and leaky_slope in [0, 1) (got {}, {})",
                self.l2, self.leaky_slope
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Dense {
    /// One row of input weights per output unit
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

impl Dense {
    fn init(inputs: usize, outputs: usize, rng: &mut StdRng) -> Self {
        // He-uniform
        let limit = (6.0 / inputs.max(1) as f64).sqrt();
        let weights = (0..outputs)
            .map(|_| (0..inputs).map(|_| rng.gen_range(-limit..limit)).collect())
            .collect();
        Self {
            weights,
            bias: vec![0.0; outputs],
        }
    }

    fn forward(&self, x: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(w, b)| dot(w, x) + b)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultilayerPerceptron {
    scaler: Standardizer,
    /// Hidden layers followed by the single-unit output layer
    layers: Vec<Dense>,
    leaky_slope: f64,
}

impl MultilayerPerceptron {
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[bool],
        options: &MlpOptions,
    ) -> Result<Self, ModelError> {
        options.validate()?;
        let width = check_training_set(rows, labels)?;
        let scaler = Standardizer::fit(rows);
        let xs = scaler.transform_batch(rows);
        let mut rng = StdRng::seed_from_u64(options.seed);

        let mut sizes = vec![width];
        sizes.extend(&options.hidden_layers);
        sizes.push(1);
        let layers = sizes
            .windows(2)
            .map(|w| Dense::init(w[0], w[1], &mut rng))
            .collect();
        let mut model = Self {
            scaler,
            layers,
            leaky_slope: options.leaky_slope,
        };

        let (w_pos, w_neg) = class_weights(labels, options.balanced_class_weights);
        let mut order: Vec<usize> = (0..xs.len()).collect();
        for epoch in 0..options.epochs {
            order.shuffle(&mut rng);
            let mut loss = 0.0;
            for batch in order.chunks(options.batch_size) {
                loss += model.step(&xs, labels, batch, (w_pos, w_neg), options);
            }
            if !loss.is_finite() {
                return Err(ModelError::Diverged);
            }
            log::debug!(
                "mlp epoch {epoch}: weighted log-loss {:.5}",
                loss / xs.len() as f64
            );
        }
        Ok(model)
    }

    fn activate(&self, z: f64) -> f64 {
        if z > 0.0 {
            z
        } else {
            self.leaky_slope * z
        }
    }

    fn activate_grad(&self, z: f64) -> f64 {
        if z > 0.0 {
            1.0
        } else {
            self.leaky_slope
        }
    }

    /// Pre-activations per layer plus the activations feeding each layer
    fn forward_trace(&self, x: &[f64]) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let mut inputs = vec![x.to_vec()];
        let mut pre = Vec::with_capacity(self.layers.len());
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            let z = layer.forward(&inputs[i]);
            if i < last {
                inputs.push(z.iter().map(|&v| self.activate(v)).collect());
            }
            pre.push(z);
        }
        (pre, inputs)
    }

    fn output(&self, x_std: &[f64]) -> f64 {
        let mut a = x_std.to_vec();
        let last = self.layers.len().saturating_sub(1);
        for (i, layer) in self.layers.iter().enumerate() {
            let z = layer.forward(&a);
            a = if i < last {
                z.iter().map(|&v| self.activate(v)).collect()
            } else {
                z
            };
        }
        sigmoid(a.first().copied().unwrap_or(0.0))
    }

    /// One mini-batch SGD update; returns the batch's summed weighted loss
    fn step(
        &mut self,
        xs: &[Vec<f64>],
        labels: &[bool],
        batch: &[usize],
        (w_pos, w_neg): (f64, f64),
        options: &MlpOptions,
    ) -> f64 {
        let mut grad_w: Vec<Vec<Vec<f64>>> = self
            .layers
            .iter()
            .map(|l| l.weights.iter().map(|r| vec![0.0; r.len()]).collect())
            .collect();
        let mut grad_b: Vec<Vec<f64>> = self.layers.iter().map(|l| vec![0.0; l.bias.len()]).collect();
        let mut loss = 0.0;

        for &idx in batch {
            let (pre, inputs) = self.forward_trace(&xs[idx]);
            let y = labels[idx];
            let weight = if y { w_pos } else { w_neg };
            let p = sigmoid(pre[pre.len() - 1][0]);
            let y_num = if y { 1.0 } else { 0.0 };
            loss -= weight * (y_num * p.max(1e-12).ln() + (1.0 - y_num) * (1.0 - p).max(1e-12).ln());

            let mut delta = vec![weight * (p - y_num)];
            for li in (0..self.layers.len()).rev() {
                for (o, &d) in delta.iter().enumerate() {
                    grad_b[li][o] += d;
                    for (g, &a) in grad_w[li][o].iter_mut().zip(&inputs[li]) {
                        *g += d * a;
                    }
                }
                if li > 0 {
                    let layer = &self.layers[li];
                    delta = (0..layer.weights[0].len())
                        .map(|j| {
                            let back: f64 = layer
                                .weights
                                .iter()
                                .zip(&delta)
                                .map(|(row, &d)| row[j] * d)
                                .sum();
                            back * self.activate_grad(pre[li - 1][j])
                        })
                        .collect();
                }
            }
        }

        let scale = options.learning_rate / batch.len() as f64;
        for (li, layer) in self.layers.iter_mut().enumerate() {
            for (o, row) in layer.weights.iter_mut().enumerate() {
                for (w, g) in row.iter_mut().zip(&grad_w[li][o]) {
                    *w -= scale * g + options.learning_rate * options.l2 * *w;
                }
            }
            for (b, g) in layer.bias.iter_mut().zip(&grad_b[li]) {
                *b -= scale * g;
            }
        }
        loss
    }
}

impl ProbabilisticClassifier for MultilayerPerceptron {
    fn predict_proba(&self, x: &[f64]) -> Result<f64, ModelError> {
        check_width(self.scaler.width(), x)?;
        Ok(self.output(&self.scaler.transform(x)))
    }

    fn n_features(&self) -> usize {
        self.scaler.width()
    }

    fn kind(&self) -> &'static str {
        "multilayer_perceptron"
    }

    fn check_shape(&self) -> Result<(), ModelError> {
        self.scaler.check_shape()?;
        if !self.leaky_slope.is_finite() {
            return Err(ModelError::MalformedParameters("non-finite leaky slope".into()));
        }
        let mut inputs = self.scaler.width();
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.weights.len() != layer.bias.len() {
                return Err(ModelError::MalformedParameters(format!(
                    "layer {i}: {} weight rows but {} biases",
                    layer.weights.len(),
                    layer.bias.len()
                )));
            }
            if layer.weights.iter().any(|row| row.len() != inputs) {
                return Err(ModelError::MalformedParameters(format!(
                    "layer {i}: expected {inputs} inputs per unit"
                )));
            }
            let finite = layer.bias.iter().all(|b| b.is_finite())
                && layer.weights.iter().flatten().all(|w| w.is_finite());
            if !finite {
                return Err(ModelError::MalformedParameters(format!(
                    "layer {i}: non-finite parameters"
                )));
            }
            inputs = layer.bias.len();
        }
        if self.layers.is_empty() || inputs != 1 {
            return Err(ModelError::MalformedParameters(
                "network must end in a single-unit output layer".into(),
            ));
        }
        Ok(())
    }
}

/// (positive, negative) sample weights; n / (2 * n_class) when balanced
fn class_weights(labels: &[bool], balanced: bool) -> (f64, f64) {
    if !balanced {
        return (1.0, 1.0);
    }
    let n = labels.len() as f64;
    let pos = labels.iter().filter(|&&y| y).count() as f64;
    let neg = n - pos;
    (n / (2.0 * pos), n / (2.0 * neg))
}
