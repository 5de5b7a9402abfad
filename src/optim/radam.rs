//! Rectified Adam optimizer

use super::adam::update_moments;
use super::optimizer::{decayed_grad, ensure_len};
use super::Optimizer;
use crate::Tensor;
use ndarray::Array1;

/// RAdam: Adam whose adaptive term is switched on only once the variance of
/// the second-moment estimate is tractable (ρ_t > 5). Before that it takes
/// bias-corrected momentum steps.
pub struct RAdam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    weight_decay: f32,
    t: u64,
    m: Vec<Option<Array1<f32>>>,
    v: Vec<Option<Array1<f32>>>,
}

impl RAdam {
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self { lr, beta1, beta2, epsilon, weight_decay: 0.0, t: 0, m: Vec::new(), v: Vec::new() }
    }

    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8)
    }

    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Rectification term for step `t`, `None` while ρ_t <= 5
    fn rectification(&self) -> Option<f32> {
        let t = self.t as i32;
        let rho_inf = 2.0 / (1.0 - self.beta2) - 1.0;
        let beta2_t = self.beta2.powi(t);
        let rho_t = rho_inf - 2.0 * self.t as f32 * beta2_t / (1.0 - beta2_t);
        if rho_t <= 5.0 {
            return None;
        }
        let r = ((rho_t - 4.0) * (rho_t - 2.0) * rho_inf)
            / ((rho_inf - 4.0) * (rho_inf - 2.0) * rho_t);
        Some(r.sqrt())
    }
}

impl Optimizer for RAdam {
    fn step(&mut self, params: &[Tensor]) {
        ensure_len(&mut self.m, params.len());
        ensure_len(&mut self.v, params.len());
        self.t += 1;

        let bias1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias2 = 1.0 - self.beta2.powi(self.t as i32);
        let rect = self.rectification();

        for (i, param) in params.iter().enumerate() {
            let Some(grad) = param.grad() else {
                continue;
            };
            let grad = decayed_grad(param, grad, self.weight_decay);
            let (m_t, v_t) =
                update_moments(self.m[i].take(), self.v[i].take(), &grad, self.beta1, self.beta2);

            let m_hat = &m_t / bias1;
            let update = match rect {
                Some(r) => {
                    let adaptive = v_t.mapv(|v| bias2.sqrt() / (v.sqrt() + self.epsilon));
                    m_hat * &adaptive * (r * self.lr)
                }
                None => m_hat * self.lr,
            };
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
        "radam"
    }
}
