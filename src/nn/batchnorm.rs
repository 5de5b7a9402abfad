//! Batch normalization over feature columns

use super::Module;
use crate::autograd::{batch_norm, NormStats, Tensor};
use std::cell::Cell;

/// BatchNorm over `(rows x num_features)` inputs
///
/// Training uses batch statistics and updates the running estimates with
/// `running = (1 - momentum) * running + momentum * batch` (unbiased
/// variance). Evaluation, and training batches of a single row, use the
/// running estimates.
pub struct BatchNorm1d {
    gamma: Tensor,
    beta: Tensor,
    running_mean: Tensor,
    running_var: Tensor,
    num_features: usize,
    momentum: f32,
    eps: f32,
    training: Cell<bool>,
}

impl BatchNorm1d {
    pub fn new(num_features: usize) -> Self {
        Self {
            gamma: Tensor::ones(num_features, true),
            beta: Tensor::zeros(num_features, true),
            running_mean: Tensor::zeros(num_features, false),
            running_var: Tensor::ones(num_features, false),
            num_features,
            momentum: 0.1,
            eps: 1e-5,
            training: Cell::new(true),
        }
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn running_mean(&self) -> Vec<f32> {
        self.running_mean.to_vec()
    }

    pub fn running_var(&self) -> Vec<f32> {
        self.running_var.to_vec()
    }

    pub fn forward(&self, x: &Tensor, rows: usize) -> Tensor {
        let use_batch = self.training.get() && rows > 1;
        let stats = if use_batch {
            NormStats::Batch
        } else {
            NormStats::Running {
                mean: self.running_mean.data().clone(),
                var: self.running_var.data().clone(),
            }
        };
        let out = batch_norm(x, &self.gamma, &self.beta, rows, self.num_features, self.eps, stats);

        if use_batch {
            let m = self.momentum;
            let unbiased = rows as f32 / (rows as f32 - 1.0);
            let mean = &*self.running_mean.data() * (1.0 - m) + &out.mean * m;
            let var = &*self.running_var.data() * (1.0 - m) + &out.var * (m * unbiased);
            self.running_mean.set_data(mean);
            self.running_var.set_data(var);
        }
        out.output
    }
}

impl Module for BatchNorm1d {
    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        vec![
            ("weight".to_string(), self.gamma.clone()),
            ("bias".to_string(), self.beta.clone()),
        ]
    }

    fn named_buffers(&self) -> Vec<(String, Tensor)> {
        vec![
            ("running_mean".to_string(), self.running_mean.clone()),
            ("running_var".to_string(), self.running_var.clone()),
        ]
    }

    fn set_training(&self, training: bool) {
        self.training.set(training);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_running_stats_update() {
        let bn = BatchNorm1d::new(1);
        let x = Tensor::from_vec(vec![1.0, 3.0], false);
        bn.forward(&x, 2);
        // mean 2, unbiased var 2
        assert_relative_eq!(bn.running_mean()[0], 0.2);
        assert_relative_eq!(bn.running_var()[0], 0.9 + 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_eval_uses_running_stats() {
        let bn = BatchNorm1d::new(2);
        bn.eval();
        let x = Tensor::from_vec(vec![1.0, -1.0], false);
        let y = bn.forward(&x, 1).to_vec();
        assert_relative_eq!(y[0], 1.0, epsilon = 1e-4);
        assert_eq!(bn.running_mean(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_state_dict_includes_buffers() {
        let bn = BatchNorm1d::new(3);
        let names: Vec<String> = bn.state_dict().names().map(String::from).collect();
        assert_eq!(names, vec!["weight", "bias", "running_mean", "running_var"]);
        assert_eq!(bn.num_parameters(), 6);
    }
}
