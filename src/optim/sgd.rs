//! Stochastic Gradient Descent optimizer

use super::optimizer::{decayed_grad, ensure_len};
use super::Optimizer;
use crate::Tensor;
use ndarray::Array1;

/// SGD optimizer with optional momentum, Nesterov momentum and L2 weight decay
pub struct SGD {
    lr: f32,
    momentum: f32,
    weight_decay: f32,
    nesterov: bool,
    velocities: Vec<Option<Array1<f32>>>,
}

impl SGD {
    /// Create a new SGD optimizer
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self { lr, momentum, weight_decay: 0.0, nesterov: false, velocities: Vec::new() }
    }

    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    pub fn with_nesterov(mut self, nesterov: bool) -> Self {
        self.nesterov = nesterov;
        self
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &[Tensor]) {
        ensure_len(&mut self.velocities, params.len());

        for (i, param) in params.iter().enumerate() {
            let Some(grad) = param.grad() else {
                continue;
            };
            let grad = decayed_grad(param, grad, self.weight_decay);

            let update = if self.momentum > 0.0 {
                // v = momentum * v + g
                let velocity = match self.velocities[i].take() {
                    Some(v) => v * self.momentum + &grad,
                    None => grad.clone(),
                };
                let update = if self.nesterov {
                    &grad + &(&velocity * self.momentum)
                } else {
                    velocity.clone()
                };
                self.velocities[i] = Some(velocity);
                update
            } else {
                grad
            };

            let updated = &*param.data() - &(update * self.lr);
            param.set_data(updated);
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn name(&self) -> &'static str {
        "sgd"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    #[test]
    fn test_sgd_plain_step() {
        let mut opt = SGD::new(0.1, 0.0);
        let p = Tensor::from_vec(vec![1.0, 2.0], true);
        p.set_grad(arr1(&[1.0, -2.0]));
        opt.step(std::slice::from_ref(&p));
        assert_abs_diff_eq!(p.data()[0], 0.9, epsilon = 1e-6);
        assert_abs_diff_eq!(p.data()[1], 2.2, epsilon = 1e-6);
    }

    #[test]
    fn test_sgd_momentum_accumulates() {
        let mut opt = SGD::new(0.1, 0.9);
        let p = Tensor::from_vec(vec![0.0], true);
        p.set_grad(arr1(&[1.0]));
        opt.step(std::slice::from_ref(&p));
        // v = 1, p = -0.1
        assert_abs_diff_eq!(p.data()[0], -0.1, epsilon = 1e-6);
        opt.step(std::slice::from_ref(&p));
        // v = 1.9, p = -0.1 - 0.19
        assert_abs_diff_eq!(p.data()[0], -0.29, epsilon = 1e-6);
    }

    #[test]
    fn test_sgd_weight_decay_shrinks_params() {
        let mut opt = SGD::new(0.1, 0.0).with_weight_decay(0.5);
        let p = Tensor::from_vec(vec![2.0], true);
        p.set_grad(arr1(&[0.0]));
        opt.step(std::slice::from_ref(&p));
        assert_abs_diff_eq!(p.data()[0], 1.9, epsilon = 1e-6);
    }

    #[test]
    fn test_sgd_skips_params_without_grad() {
        let mut opt = SGD::new(0.1, 0.9);
        let p = Tensor::from_vec(vec![3.0], true);
        opt.step(std::slice::from_ref(&p));
        assert_eq!(p.data()[0], 3.0);
    }

    #[test]
    fn test_sgd_converges_on_quadratic() {
        // f(x) = (x - 3)^2
        let mut opt = SGD::new(0.1, 0.5).with_nesterov(true);
        let x = Tensor::from_vec(vec![0.0], true);
        for _ in 0..200 {
            let g = 2.0 * (x.data()[0] - 3.0);
            x.set_grad(arr1(&[g]));
            opt.step(std::slice::from_ref(&x));
        }
        assert_abs_diff_eq!(x.data()[0], 3.0, epsilon = 1e-3);
    }
}
