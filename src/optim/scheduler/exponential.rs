//! Exponential learning rate decay

use super::LRScheduler;

/// lr_t = lr_initial * gamma^epoch
pub struct ExponentialLR {
    lr_initial: f32,
    gamma: f32,
    current_epoch: usize,
}

impl ExponentialLR {
    pub fn new(lr_initial: f32, gamma: f32) -> Self {
        Self { lr_initial, gamma, current_epoch: 0 }
    }
}

impl LRScheduler for ExponentialLR {
    fn get_lr(&self) -> f32 {
        self.lr_initial * self.gamma.powi(self.current_epoch as i32)
    }

    fn step(&mut self) {
        self.current_epoch += 1;
    }

    fn name(&self) -> &'static str {
        "exponential"
    }
}
