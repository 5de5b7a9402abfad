//! Core traits and types for the callback system
//!
//! - `CallbackContext` - State passed to callbacks
//! - `CallbackAction` - Actions a callback can request
//! - `TrainerCallback` - The trait all callbacks implement

use crate::nn::Module;
use crate::optim::StepMode;
use crate::Result;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// Context passed to callbacks with current training state
pub struct CallbackContext<'a> {
    /// Current epoch (0-indexed)
    pub epoch: usize,
    /// Total epochs planned
    pub max_epochs: usize,
    /// Current batch within the epoch
    pub batch: usize,
    /// Batches per training epoch
    pub batches_per_epoch: usize,
    /// Optimizer steps taken so far
    pub global_step: usize,
    /// Last batch loss, or the epoch's mean training loss at epoch end
    pub loss: f32,
    /// Epoch-level values (`train_loss`, `val_loss`, `train_acc`, ...)
    pub logs: BTreeMap<String, f32>,
    /// Current learning rate of every parameter group
    pub lrs: BTreeMap<String, f32>,
    /// Step mode of every group that has a scheduler
    pub schedules: BTreeMap<String, StepMode>,
    /// Seconds since training started
    pub elapsed_secs: f64,
    /// Model being trained
    pub model: Option<&'a dyn Module>,
}

impl Default for CallbackContext<'_> {
    fn default() -> Self {
        Self {
            epoch: 0,
            max_epochs: 0,
            batch: 0,
            batches_per_epoch: 0,
            global_step: 0,
            loss: 0.0,
            logs: BTreeMap::new(),
            lrs: BTreeMap::new(),
            schedules: BTreeMap::new(),
            elapsed_secs: 0.0,
            model: None,
        }
    }
}

impl fmt::Debug for CallbackContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackContext")
            .field("epoch", &self.epoch)
            .field("max_epochs", &self.max_epochs)
            .field("batch", &self.batch)
            .field("batches_per_epoch", &self.batches_per_epoch)
            .field("global_step", &self.global_step)
            .field("loss", &self.loss)
            .field("logs", &self.logs)
            .field("lrs", &self.lrs)
            .field("has_model", &self.model.is_some())
            .finish()
    }
}

/// Action to take after a callback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    /// Continue training normally
    Continue,
    /// Stop training after the current epoch
    Stop,
}

/// Trait for training callbacks
///
/// Implement this trait to hook into training events. All methods have
/// default no-op implementations, so you only need to implement the
/// events you care about. Errors abort `fit` and are returned to the caller.
pub trait TrainerCallback: Any + Send {
    /// Called before training starts
    fn on_train_begin(&mut self, _ctx: &CallbackContext) -> Result<CallbackAction> {
        Ok(CallbackAction::Continue)
    }

    /// Called after training ends
    fn on_train_end(&mut self, _ctx: &CallbackContext) -> Result<()> {
        Ok(())
    }

    /// Called before each epoch
    fn on_epoch_begin(&mut self, _ctx: &CallbackContext) -> Result<CallbackAction> {
        Ok(CallbackAction::Continue)
    }

    /// Called after each epoch, once the logs are complete
    fn on_epoch_end(&mut self, _ctx: &CallbackContext) -> Result<CallbackAction> {
        Ok(CallbackAction::Continue)
    }

    /// Called before each training batch
    fn on_batch_begin(&mut self, _ctx: &CallbackContext) -> Result<CallbackAction> {
        Ok(CallbackAction::Continue)
    }

    /// Called after each training batch and its scheduler steps
    fn on_batch_end(&mut self, _ctx: &CallbackContext) -> Result<CallbackAction> {
        Ok(CallbackAction::Continue)
    }

    /// Get callback name for logging
    fn name(&self) -> &'static str {
        "TrainerCallback"
    }
}
