//! Reduce the learning rate when a metric stops improving

use super::LRScheduler;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Direction of improvement for the monitored metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateauMode {
    #[default]
    Min,
    Max,
}

/// How `threshold` is compared against the best value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    /// Improvement relative to the best value
    #[default]
    Rel,
    /// Absolute improvement
    Abs,
}

/// Multiplies the learning rate by `factor` once `patience` epochs pass
/// without the metric improving by more than `threshold`
///
/// After a reduction, `cooldown` epochs are ignored before bad epochs count
/// again. The learning rate never drops below `min_lr`.
#[derive(Debug, Clone)]
pub struct ReduceLROnPlateau {
    lr: f32,
    mode: PlateauMode,
    factor: f32,
    patience: usize,
    threshold: f32,
    threshold_mode: ThresholdMode,
    cooldown: usize,
    min_lr: f32,
    eps: f32,
    best: f32,
    num_bad_epochs: usize,
    cooldown_counter: usize,
}

impl ReduceLROnPlateau {
    /// Factor 0.1, patience 10, relative threshold 1e-4, no cooldown
    pub fn new(lr: f32) -> Self {
        Self {
            lr,
            mode: PlateauMode::Min,
            factor: 0.1,
            patience: 10,
            threshold: 1e-4,
            threshold_mode: ThresholdMode::Rel,
            cooldown: 0,
            min_lr: 0.0,
            eps: 1e-8,
            best: f32::INFINITY,
            num_bad_epochs: 0,
            cooldown_counter: 0,
        }
    }

    pub fn with_mode(mut self, mode: PlateauMode) -> Self {
        self.mode = mode;
        self.best = match mode {
            PlateauMode::Min => f32::INFINITY,
            PlateauMode::Max => f32::NEG_INFINITY,
        };
        self
    }

    pub fn with_factor(mut self, factor: f32) -> Self {
        self.factor = factor;
        self
    }

    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    pub fn with_threshold(mut self, threshold: f32, threshold_mode: ThresholdMode) -> Self {
        self.threshold = threshold;
        self.threshold_mode = threshold_mode;
        self
    }

    pub fn with_cooldown(mut self, cooldown: usize) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_min_lr(mut self, min_lr: f32) -> Self {
        self.min_lr = min_lr;
        self
    }

    pub fn num_bad_epochs(&self) -> usize {
        self.num_bad_epochs
    }

    fn is_better(&self, current: f32) -> bool {
        match (self.mode, self.threshold_mode) {
            (PlateauMode::Min, ThresholdMode::Rel) => current < self.best * (1.0 - self.threshold),
            (PlateauMode::Min, ThresholdMode::Abs) => current < self.best - self.threshold,
            (PlateauMode::Max, ThresholdMode::Rel) => current > self.best * (1.0 + self.threshold),
            (PlateauMode::Max, ThresholdMode::Abs) => current > self.best + self.threshold,
        }
    }

    fn reduce_lr(&mut self) {
        let new_lr = (self.lr * self.factor).max(self.min_lr);
        if self.lr - new_lr > self.eps {
            info!(old_lr = self.lr, new_lr, "reducing learning rate on plateau");
            self.lr = new_lr;
        }
    }
}

impl LRScheduler for ReduceLROnPlateau {
    fn get_lr(&self) -> f32 {
        self.lr
    }

    /// Without a metric there is nothing to compare against
    fn step(&mut self) {}

    fn step_with_metric(&mut self, metric: f32) {
        if self.is_better(metric) {
            self.best = metric;
            self.num_bad_epochs = 0;
        } else {
            self.num_bad_epochs += 1;
        }

        if self.cooldown_counter > 0 {
            self.cooldown_counter -= 1;
            self.num_bad_epochs = 0;
        }

        if self.num_bad_epochs > self.patience {
            self.reduce_lr();
            self.cooldown_counter = self.cooldown;
            self.num_bad_epochs = 0;
        }
    }

    fn needs_metric(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "reduce_on_plateau"
    }
}
