//! Early stopping callback to halt training when a monitored value plateaus

use super::monitor::MonitorMode;
use super::traits::{CallbackAction, CallbackContext, TrainerCallback};
use crate::nn::StateDict;
use crate::Result;
use tracing::{info, warn};

/// Early stopping callback to halt training when a monitored value plateaus
///
/// Watches one epoch log (`val_loss` by default) and stops training once
/// `patience` consecutive epochs pass without an improvement larger than
/// `min_delta`. With `restore_best_weights` the model is rolled back to the
/// best epoch's weights when training stops.
///
/// # Example
///
/// ```rust
/// use widedeep::train::callback::EarlyStopping;
///
/// // Stop if val_loss does not improve by 0.001 for 5 epochs
/// let early_stop = EarlyStopping::new("val_loss").with_patience(5).with_min_delta(0.001);
/// ```
#[derive(Clone, Debug)]
pub struct EarlyStopping {
    monitor: String,
    min_delta: f32,
    patience: usize,
    mode: MonitorMode,
    baseline: Option<f32>,
    restore_best_weights: bool,
    best: f32,
    /// Epochs without improvement
    pub(crate) wait: usize,
    stopped_epoch: Option<usize>,
    best_weights: Option<StateDict>,
}

impl EarlyStopping {
    /// Create an early stopping callback monitoring the `monitor` log
    pub fn new(monitor: impl Into<String>) -> Self {
        Self {
            monitor: monitor.into(),
            min_delta: 0.0,
            patience: 10,
            mode: MonitorMode::Auto,
            baseline: None,
            restore_best_weights: false,
            best: f32::INFINITY,
            wait: 0,
            stopped_epoch: None,
            best_weights: None,
        }
    }

    /// Minimum change that counts as an improvement
    pub fn with_min_delta(mut self, min_delta: f32) -> Self {
        self.min_delta = min_delta.abs();
        self
    }

    /// Epochs without improvement before stopping
    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    pub fn with_mode(mut self, mode: MonitorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Value the monitored log has to beat before any epoch counts as an improvement
    pub fn with_baseline(mut self, baseline: f32) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// Roll the model back to the best epoch when stopping
    pub fn with_restore_best_weights(mut self, restore: bool) -> Self {
        self.restore_best_weights = restore;
        self
    }

    pub fn monitor(&self) -> &str {
        &self.monitor
    }

    /// Best value of the monitored log so far
    pub fn best(&self) -> f32 {
        self.best
    }

    /// Epoch (0-indexed) at which training was stopped
    pub fn stopped_epoch(&self) -> Option<usize> {
        self.stopped_epoch
    }

    fn mode(&self) -> MonitorMode {
        self.mode.resolve(&self.monitor)
    }

    /// Reset internal state
    pub fn reset(&mut self) {
        self.best = self.baseline.unwrap_or_else(|| self.mode().worst());
        self.wait = 0;
        self.stopped_epoch = None;
        self.best_weights = None;
    }
}

impl TrainerCallback for EarlyStopping {
    fn on_train_begin(&mut self, _ctx: &CallbackContext) -> Result<CallbackAction> {
        self.reset();
        Ok(CallbackAction::Continue)
    }

    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
        let Some(&current) = ctx.logs.get(&self.monitor) else {
            warn!(
                monitor = %self.monitor,
                available = ?ctx.logs.keys().collect::<Vec<_>>(),
                "early stopping conditioned on a value that is not logged"
            );
            return Ok(CallbackAction::Continue);
        };

        if self.mode().improved(current, self.best, self.min_delta) {
            self.best = current;
            self.wait = 0;
            if self.restore_best_weights {
                self.best_weights = ctx.model.map(|m| m.state_dict());
            }
            return Ok(CallbackAction::Continue);
        }

        self.wait += 1;
        if self.wait < self.patience {
            return Ok(CallbackAction::Continue);
        }

        self.stopped_epoch = Some(ctx.epoch);
        info!(
            epoch = ctx.epoch + 1,
            monitor = %self.monitor,
            best = self.best,
            "early stopping: no improvement for {} epochs",
            self.patience
        );
        if let (Some(weights), Some(model)) = (&self.best_weights, ctx.model) {
            info!("restoring model weights from the best epoch");
            model.load_state_dict(weights)?;
        }
        Ok(CallbackAction::Stop)
    }

    fn name(&self) -> &'static str {
        "EarlyStopping"
    }
}
