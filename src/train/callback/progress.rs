//! Progress callback for logging training progress

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};
use crate::Result;
use std::fmt::Write;
use tracing::{debug, info};

/// Progress callback for logging training progress through `tracing`
#[derive(Clone, Debug)]
pub struct ProgressCallback {
    /// Log every N batches
    log_interval: usize,
}

impl ProgressCallback {
    /// Create progress callback
    pub fn new(log_interval: usize) -> Self {
        Self { log_interval }
    }

    /// One-line summary of an epoch's logs
    pub fn format_epoch(ctx: &CallbackContext) -> String {
        let mut line = format!("Epoch {}/{}:", ctx.epoch + 1, ctx.max_epochs);
        for (key, value) in &ctx.logs {
            let _ = write!(line, " {key}: {value:.4}");
        }
        let _ = write!(line, " ({:.1}s)", ctx.elapsed_secs);
        line
    }
}

impl Default for ProgressCallback {
    fn default() -> Self {
        Self { log_interval: 10 }
    }
}

impl TrainerCallback for ProgressCallback {
    fn on_epoch_begin(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
        debug!(epoch = ctx.epoch + 1, max_epochs = ctx.max_epochs, lrs = ?ctx.lrs, "epoch starting");
        Ok(CallbackAction::Continue)
    }

    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
        info!("{}", Self::format_epoch(ctx));
        Ok(CallbackAction::Continue)
    }

    fn on_batch_end(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
        let batch = ctx.batch + 1;
        if self.log_interval > 0 && batch % self.log_interval == 0 {
            debug!("  Batch {}/{}: loss: {:.4}", batch, ctx.batches_per_epoch, ctx.loss);
        }
        Ok(CallbackAction::Continue)
    }

    fn name(&self) -> &'static str {
        "ProgressCallback"
    }
}
