//! RMSprop optimizer

use super::optimizer::{decayed_grad, ensure_len};
use super::Optimizer;
use crate::Tensor;
use ndarray::Array1;

/// RMSprop: divides the gradient by a running RMS of recent gradients
pub struct RMSprop {
    lr: f32,
    alpha: f32,
    epsilon: f32,
    momentum: f32,
    weight_decay: f32,
    square_avg: Vec<Option<Array1<f32>>>,
    momentum_buf: Vec<Option<Array1<f32>>>,
}

impl RMSprop {
    pub fn new(lr: f32, alpha: f32, epsilon: f32) -> Self {
        Self {
            lr,
            alpha,
            epsilon,
            momentum: 0.0,
            weight_decay: 0.0,
            square_avg: Vec::new(),
            momentum_buf: Vec::new(),
        }
    }

    /// RMSprop with α = 0.99, ε = 1e-8
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.99, 1e-8)
    }

    pub fn with_momentum(mut self, momentum: f32) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }
}

impl Optimizer for RMSprop {
    fn step(&mut self, params: &[Tensor]) {
        ensure_len(&mut self.square_avg, params.len());
        ensure_len(&mut self.momentum_buf, params.len());

        for (i, param) in params.iter().enumerate() {
            let Some(grad) = param.grad() else {
                continue;
            };
            let grad = decayed_grad(param, grad, self.weight_decay);

            let grad_sq = &grad * &grad;
            let avg = match self.square_avg[i].take() {
                Some(a) => a * self.alpha + &(grad_sq * (1.0 - self.alpha)),
                None => grad_sq * (1.0 - self.alpha),
            };
            let scaled = &grad / &(avg.mapv(f32::sqrt) + self.epsilon);
            self.square_avg[i] = Some(avg);

            let update = if self.momentum > 0.0 {
                let buf = match self.momentum_buf[i].take() {
                    Some(b) => b * self.momentum + &scaled,
                    None => scaled,
                };
                self.momentum_buf[i] = Some(buf.clone());
                buf
            } else {
                scaled
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
        "rmsprop"
    }
}
