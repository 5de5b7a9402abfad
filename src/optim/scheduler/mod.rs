//! Learning rate schedulers
//!
//! Provides learning rate scheduling strategies for training:
//! - `StepLR` - Decay by a factor every N epochs
//! - `MultiStepLR` - Decay by a factor at fixed milestones
//! - `ExponentialLR` - Decay by a factor every epoch
//! - `ReduceLROnPlateau` - Decay when a monitored metric stalls
//! - `CyclicLR` - Cycle between two bounds every batch
//! - `OneCycleLR` - Warm up to a peak then anneal, every batch

mod cyclic;
mod exponential;
mod multi_step;
mod one_cycle;
mod plateau;
mod step;

#[cfg(test)]
mod tests;

pub use cyclic::{CyclicLR, CyclicMode};
pub use exponential::ExponentialLR;
pub use multi_step::MultiStepLR;
pub use one_cycle::{AnnealStrategy, OneCycleLR};
pub use plateau::{PlateauMode, ReduceLROnPlateau, ThresholdMode};
pub use step::StepLR;

use super::Optimizer;

/// When the trainer advances a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    /// After every optimizer step
    PerBatch,
    /// After every epoch
    PerEpoch,
}

/// Learning rate scheduler trait
pub trait LRScheduler {
    /// Get the current learning rate
    fn get_lr(&self) -> f32;

    /// Step the scheduler
    fn step(&mut self);

    /// Step with the value of a monitored metric
    ///
    /// Only metric-driven schedulers use the value; the rest just step.
    fn step_with_metric(&mut self, _metric: f32) {
        self.step();
    }

    /// Whether the scheduler advances per batch or per epoch
    fn step_mode(&self) -> StepMode {
        StepMode::PerEpoch
    }

    /// Whether [`LRScheduler::step_with_metric`] needs a real metric
    fn needs_metric(&self) -> bool {
        false
    }

    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Apply the current learning rate to an optimizer
    fn apply(&self, optimizer: &mut dyn Optimizer) {
        optimizer.set_lr(self.get_lr());
    }
}
