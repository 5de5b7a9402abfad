//! Adam optimizer

use super::optimizer::{decayed_grad, ensure_len};
use super::Optimizer;
use crate::Tensor;
use ndarray::Array1;

/// Adam optimizer with optional L2 weight decay
///
/// m_t = β1 m + (1 - β1) g, v_t = β2 v + (1 - β2) g², and
/// θ_t = θ - lr_t m_t / (√v_t + ε) with the bias correction folded into lr_t.
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    weight_decay: f32,
    t: u64,
    m: Vec<Option<Array1<f32>>>,
    v: Vec<Option<Array1<f32>>>,
}

impl Adam {
    /// Create a new Adam optimizer
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self { lr, beta1, beta2, epsilon, weight_decay: 0.0, t: 0, m: Vec::new(), v: Vec::new() }
    }

    /// Adam with β1 = 0.9, β2 = 0.999, ε = 1e-8
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8)
    }

    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.t
    }
}

/// Shared first/second moment update; returns the new `(m, v)`
pub(crate) fn update_moments(
    m: Option<Array1<f32>>,
    v: Option<Array1<f32>>,
    grad: &Array1<f32>,
    beta1: f32,
    beta2: f32,
) -> (Array1<f32>, Array1<f32>) {
    let m_t = match m {
        Some(m) => m * beta1 + &(grad * (1.0 - beta1)),
        None => grad * (1.0 - beta1),
    };
    let grad_sq = grad * grad;
    let v_t = match v {
        Some(v) => v * beta2 + &(&grad_sq * (1.0 - beta2)),
        None => grad_sq * (1.0 - beta2),
    };
    (m_t, v_t)
}

impl Optimizer for Adam {
    fn step(&mut self, params: &[Tensor]) {
        ensure_len(&mut self.m, params.len());
        ensure_len(&mut self.v, params.len());
        self.t += 1;

        let lr_t = self.lr
            * ((1.0 - self.beta2.powi(self.t as i32)).sqrt()
                / (1.0 - self.beta1.powi(self.t as i32)));

        for (i, param) in params.iter().enumerate() {
            let Some(grad) = param.grad() else {
                continue;
            };
            let grad = decayed_grad(param, grad, self.weight_decay);
            let (m_t, v_t) =
                update_moments(self.m[i].take(), self.v[i].take(), &grad, self.beta1, self.beta2);

            let update = &m_t / &(v_t.mapv(f32::sqrt) + self.epsilon) * lr_t;
            let updated = &*param.data() - &update;
            param.set_data(updated);

            self.m[i] = Some(m_t);
            self.v[i] = Some(v_t);
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn name(&self) -> &'static str {
        "adam"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    #[test]
    fn test_adam_first_step_is_lr_sized() {
        // With bias correction the first update is ~lr * sign(g)
        let mut opt = Adam::default_params(0.01);
        let p = Tensor::from_vec(vec![1.0, 1.0], true);
        p.set_grad(arr1(&[5.0, -0.2]));
        opt.step(std::slice::from_ref(&p));
        assert_abs_diff_eq!(p.data()[0], 0.99, epsilon = 1e-5);
        assert_abs_diff_eq!(p.data()[1], 1.01, epsilon = 1e-5);
        assert_eq!(opt.step_count(), 1);
    }

    #[test]
    fn test_adam_converges_on_quadratic() {
        let mut opt = Adam::default_params(0.1);
        let x = Tensor::from_vec(vec![-2.0, 4.0], true);
        for _ in 0..500 {
            let g = x.data().mapv(|v| 2.0 * (v - 1.0));
            x.set_grad(g);
            opt.step(std::slice::from_ref(&x));
        }
        for v in x.to_vec() {
            assert_abs_diff_eq!(v, 1.0, epsilon = 5e-2);
        }
    }
}
