//! Milestone-based learning rate decay

use super::LRScheduler;

/// Multiplies the learning rate by `gamma` each time the epoch count reaches
/// one of the milestones
pub struct MultiStepLR {
    lr_initial: f32,
    gamma: f32,
    milestones: Vec<usize>,
    current_epoch: usize,
}

impl MultiStepLR {
    pub fn new(lr_initial: f32, mut milestones: Vec<usize>, gamma: f32) -> Self {
        milestones.sort_unstable();
        Self { lr_initial, gamma, milestones, current_epoch: 0 }
    }
}

impl LRScheduler for MultiStepLR {
    fn get_lr(&self) -> f32 {
        let passed = self.milestones.iter().filter(|&&m| m <= self.current_epoch).count();
        self.lr_initial * self.gamma.powi(passed as i32)
    }

    fn step(&mut self) {
        self.current_epoch += 1;
    }

    fn name(&self) -> &'static str {
        "multi_step"
    }
}
