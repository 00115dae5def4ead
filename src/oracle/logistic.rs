//! Logistic ranking oracle
//!
//! Single linear layer with a sigmoid head, trained full-batch with SGD on
//! the seeded NdArray autodiff backend. Features are standardized per column
//! first, so the fitted weight magnitudes are directly comparable and serve
//! as importance scores.

use burn::backend::{Autodiff, NdArray};
use burn::nn::{Linear, LinearConfig};
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::oracle::RankingOracle;
use crate::{KaisenError, Result};

type B = Autodiff<NdArray<f32>>;

/// Deterministic logistic-regression oracle
pub struct LogisticOracle {
    epochs: usize,
    learning_rate: f64,
    seed: u64,
}

impl LogisticOracle {
    pub fn new(epochs: usize, learning_rate: f64, seed: u64) -> Self {
        LogisticOracle {
            epochs,
            learning_rate,
            seed,
        }
    }
}

impl Default for LogisticOracle {
    fn default() -> Self {
        LogisticOracle::new(200, 0.1, 42)
    }
}

impl RankingOracle for LogisticOracle {
    fn fit(&self, features: &[Vec<f64>], labels: &[f64]) -> Result<Vec<f64>> {
        let rows = features.len();
        let cols = features.first().map(Vec::len).unwrap_or(0);
        if rows == 0 || cols == 0 || rows != labels.len() {
            return Err(KaisenError::Oracle(
                "feature matrix and labels are empty or mismatched".to_string(),
            ));
        }

        let norm = ColumnNormalization::from_matrix(features, cols);
        let mut x_flat = Vec::with_capacity(rows * cols);
        for row in features {
            for (col, value) in row.iter().enumerate() {
                x_flat.push(norm.apply(col, *value) as f32);
            }
        }
        let y_flat: Vec<f32> = labels.iter().map(|l| *l as f32).collect();

        B::seed(self.seed);
        let device = <B as Backend>::Device::default();

        let x: Tensor<B, 2> =
            Tensor::<B, 1>::from_floats(x_flat.as_slice(), &device).reshape([rows, cols]);
        let y: Tensor<B, 2> =
            Tensor::<B, 1>::from_floats(y_flat.as_slice(), &device).reshape([rows, 1]);

        let mut model: Linear<B> = LinearConfig::new(cols, 1).init(&device);
        let mut optimizer = SgdConfig::new().init();

        for epoch in 0..self.epochs {
            let logits = model.forward(x.clone());
            let probs = sigmoid(logits);
            let loss = binary_cross_entropy(probs, y.clone());

            if epoch % 50 == 0 {
                log::debug!("Oracle epoch {}/{}", epoch + 1, self.epochs);
            }

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(self.learning_rate, model, grads);
        }

        let weights = model.weight.val().into_data();
        let weights: &[f32] = weights
            .as_slice()
            .map_err(|e| KaisenError::Oracle(format!("failed to read fitted weights: {:?}", e)))?;

        let mut importances: Vec<f64> = weights.iter().map(|w| w.abs() as f64).collect();
        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            for value in &mut importances {
                *value /= sum;
            }
        }
        Ok(importances)
    }
}

fn binary_cross_entropy(probs: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let eps = 1e-7;
    let probs = probs.clamp(eps, 1.0 - eps);
    let loss = targets.clone().neg() * probs.clone().log()
        - (targets.neg() + 1.0) * (probs.neg() + 1.0).log();
    loss.mean()
}

/// Per-column mean/std with a zero-variance guard
struct ColumnNormalization {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl ColumnNormalization {
    fn from_matrix(matrix: &[Vec<f64>], cols: usize) -> Self {
        let n = matrix.len() as f64;

        let mut mean = vec![0.0; cols];
        for row in matrix {
            for (col, value) in row.iter().enumerate() {
                mean[col] += value;
            }
        }
        for value in &mut mean {
            *value /= n;
        }

        let mut std = vec![0.0; cols];
        for row in matrix {
            for (col, value) in row.iter().enumerate() {
                std[col] += (value - mean[col]).powi(2);
            }
        }
        for value in &mut std {
            *value = (*value / n).sqrt();
            if *value < 1e-8 {
                *value = 1.0;
            }
        }

        ColumnNormalization { mean, std }
    }

    fn apply(&self, col: usize, value: f64) -> f64 {
        (value - self.mean[col]) / self.std[col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two features: the first perfectly separates the labels, the second is
    /// constant noise.
    fn separable_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let label = (i % 2) as f64;
            let signal = if label > 0.5 { 25.0 } else { -25.0 };
            features.push(vec![signal, 3.0]);
            labels.push(label);
        }
        (features, labels)
    }

    #[test]
    fn test_signal_feature_dominates() {
        let (features, labels) = separable_data();
        let oracle = LogisticOracle::new(100, 0.5, 42);
        let importances = oracle.fit(&features, &labels).unwrap();

        assert_eq!(importances.len(), 2);
        assert!(importances.iter().all(|v| *v >= 0.0));
        assert!(importances[0] > importances[1]);

        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let (features, labels) = separable_data();
        let oracle = LogisticOracle::new(50, 0.5, 42);

        let first = oracle.fit(&features, &labels).unwrap();
        let second = oracle.fit(&features, &labels).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_matrix_is_an_error() {
        let oracle = LogisticOracle::default();
        assert!(oracle.fit(&[], &[]).is_err());
    }

    #[test]
    fn test_zero_variance_column_guard() {
        let norm = ColumnNormalization::from_matrix(&[vec![5.0], vec![5.0]], 1);
        assert_eq!(norm.apply(0, 5.0), 0.0);
        assert_eq!(norm.apply(0, 6.0), 1.0);
    }
}
