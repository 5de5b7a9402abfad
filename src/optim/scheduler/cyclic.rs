//! Cyclical learning rates

use super::{LRScheduler, StepMode};
use serde::{Deserialize, Serialize};

/// Amplitude policy of a [`CyclicLR`]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclicMode {
    /// Constant amplitude
    #[default]
    Triangular,
    /// Amplitude halves every cycle
    Triangular2,
    /// Amplitude scales by `gamma^iteration`
    ExpRange { gamma: f32 },
}

/// Cycles the learning rate between `base_lr` and `max_lr`
///
/// One cycle is `step_size_up` batches rising followed by `step_size_down`
/// batches falling. Stepped after every batch.
#[derive(Debug, Clone)]
pub struct CyclicLR {
    base_lr: f32,
    max_lr: f32,
    step_size_up: usize,
    step_size_down: usize,
    mode: CyclicMode,
    iteration: usize,
}

impl CyclicLR {
    /// Symmetric cycle with `step_size_up` batches per half
    pub fn new(base_lr: f32, max_lr: f32, step_size_up: usize) -> Self {
        let step_size_up = step_size_up.max(1);
        Self {
            base_lr,
            max_lr,
            step_size_up,
            step_size_down: step_size_up,
            mode: CyclicMode::Triangular,
            iteration: 0,
        }
    }

    pub fn with_step_size_down(mut self, step_size_down: usize) -> Self {
        self.step_size_down = step_size_down;
        self
    }

    pub fn with_mode(mut self, mode: CyclicMode) -> Self {
        self.mode = mode;
        self
    }

    fn cycle_len(&self) -> usize {
        self.step_size_up + self.step_size_down
    }
}

impl LRScheduler for CyclicLR {
    fn get_lr(&self) -> f32 {
        let total = self.cycle_len() as f32;
        let step_ratio = self.step_size_up as f32 / total;
        let progress = self.iteration as f32 / total;
        let cycle = (1.0 + progress).floor();
        let x = 1.0 + progress - cycle;

        let scale_factor = if x <= step_ratio {
            x / step_ratio
        } else {
            (x - 1.0) / (step_ratio - 1.0)
        };
        let height = (self.max_lr - self.base_lr) * scale_factor;

        let amplitude = match self.mode {
            CyclicMode::Triangular => 1.0,
            CyclicMode::Triangular2 => 1.0 / 2f32.powf(cycle - 1.0),
            CyclicMode::ExpRange { gamma } => gamma.powi(self.iteration as i32),
        };
        self.base_lr + height * amplitude
    }

    fn step(&mut self) {
        self.iteration += 1;
    }

    fn step_mode(&self) -> StepMode {
        StepMode::PerBatch
    }

    fn name(&self) -> &'static str {
        "cyclic"
    }
}
