//! One-cycle learning rate policy

use super::{LRScheduler, StepMode};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Interpolation used between phase endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnealStrategy {
    #[default]
    Cos,
    Linear,
}

impl AnnealStrategy {
    fn anneal(self, start: f32, end: f32, pct: f32) -> f32 {
        match self {
            Self::Cos => end + (start - end) / 2.0 * ((PI * pct).cos() + 1.0),
            Self::Linear => (end - start) * pct + start,
        }
    }
}

/// Warm up from `max_lr / div_factor` to `max_lr` over the first `pct_start`
/// of the steps, then anneal to `initial_lr / final_div_factor`
///
/// Stepped after every batch; steps past `total_steps` hold the final value.
#[derive(Debug, Clone)]
pub struct OneCycleLR {
    max_lr: f32,
    total_steps: usize,
    pct_start: f32,
    anneal: AnnealStrategy,
    div_factor: f32,
    final_div_factor: f32,
    step_num: usize,
}

impl OneCycleLR {
    /// pct_start 0.3, cosine annealing, div_factor 25, final_div_factor 1e4
    pub fn new(max_lr: f32, total_steps: usize) -> Self {
        Self {
            max_lr,
            total_steps: total_steps.max(1),
            pct_start: 0.3,
            anneal: AnnealStrategy::Cos,
            div_factor: 25.0,
            final_div_factor: 1e4,
            step_num: 0,
        }
    }

    /// Total steps derived from the epoch count and batches per epoch
    pub fn from_epochs(max_lr: f32, epochs: usize, steps_per_epoch: usize) -> Self {
        Self::new(max_lr, epochs * steps_per_epoch)
    }

    pub fn with_pct_start(mut self, pct_start: f32) -> Self {
        self.pct_start = pct_start.clamp(0.0, 1.0);
        self
    }

    pub fn with_anneal_strategy(mut self, anneal: AnnealStrategy) -> Self {
        self.anneal = anneal;
        self
    }

    pub fn with_div_factors(mut self, div_factor: f32, final_div_factor: f32) -> Self {
        self.div_factor = div_factor;
        self.final_div_factor = final_div_factor;
        self
    }

    fn initial_lr(&self) -> f32 {
        self.max_lr / self.div_factor
    }

    fn min_lr(&self) -> f32 {
        self.initial_lr() / self.final_div_factor
    }
}

impl LRScheduler for OneCycleLR {
    fn get_lr(&self) -> f32 {
        let warmup_end = (self.pct_start * self.total_steps as f32 - 1.0).max(0.0);
        let last_step = (self.total_steps - 1) as f32;
        let step = (self.step_num as f32).min(last_step);

        if step <= warmup_end && warmup_end > 0.0 {
            self.anneal.anneal(self.initial_lr(), self.max_lr, step / warmup_end)
        } else {
            let span = (last_step - warmup_end).max(1.0);
            let pct = ((step - warmup_end) / span).clamp(0.0, 1.0);
            self.anneal.anneal(self.max_lr, self.min_lr(), pct)
        }
    }

    fn step(&mut self) {
        self.step_num += 1;
    }

    fn step_mode(&self) -> StepMode {
        StepMode::PerBatch
    }

    fn name(&self) -> &'static str {
        "one_cycle"
    }
}
