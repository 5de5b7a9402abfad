//! Checkpoint callback for saving model weights periodically

use super::monitor::MonitorMode;
use super::traits::{CallbackAction, CallbackContext, TrainerCallback};
use crate::io::save_state_dict;
use crate::{Error, Result};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Saves the model's weights every `period` epochs
///
/// Files are named `<filepath>_<epoch>.safetensors` with 1-based epochs and
/// carry the epoch and the monitored value in their metadata. With
/// `save_best_only` a file is written only when the monitored log improves.
/// `max_save = 0` keeps every file; otherwise the oldest files written by this
/// callback are deleted so that at most `max_save` remain.
#[derive(Clone, Debug)]
pub struct ModelCheckpoint {
    filepath: PathBuf,
    monitor: String,
    save_best_only: bool,
    mode: MonitorMode,
    period: usize,
    max_save: usize,
    best: f32,
    epochs_since_last_save: usize,
    saved: VecDeque<PathBuf>,
}

impl ModelCheckpoint {
    /// Create a checkpoint callback writing files prefixed with `filepath`
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
            monitor: "val_loss".to_string(),
            save_best_only: false,
            mode: MonitorMode::Auto,
            period: 1,
            max_save: 0,
            best: f32::INFINITY,
            epochs_since_last_save: 0,
            saved: VecDeque::new(),
        }
    }

    pub fn with_monitor(mut self, monitor: impl Into<String>) -> Self {
        self.monitor = monitor.into();
        self
    }

    /// Only write a file when the monitored log improves
    pub fn with_save_best_only(mut self, save_best_only: bool) -> Self {
        self.save_best_only = save_best_only;
        self
    }

    pub fn with_mode(mut self, mode: MonitorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Epochs between checkpoints
    pub fn with_period(mut self, period: usize) -> Self {
        self.period = period.max(1);
        self
    }

    /// Maximum number of files kept on disk; 0 keeps all
    pub fn with_max_save(mut self, max_save: usize) -> Self {
        self.max_save = max_save;
        self
    }

    /// Path of the checkpoint for `epoch` (0-indexed)
    pub fn checkpoint_path(&self, epoch: usize) -> PathBuf {
        let mut name = self.filepath.file_name().unwrap_or_default().to_os_string();
        name.push(format!("_{}.safetensors", epoch + 1));
        self.filepath.with_file_name(name)
    }

    /// Files written by this callback that are still on disk, oldest first
    pub fn saved_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.saved.iter()
    }

    /// Best value of the monitored log seen with `save_best_only`
    pub fn best(&self) -> f32 {
        self.best
    }

    fn save(&mut self, ctx: &CallbackContext, monitored: Option<f32>) -> Result<()> {
        let path = self.checkpoint_path(ctx.epoch);
        let model = ctx.model.ok_or_else(|| Error::Checkpoint {
            path: path.clone(),
            message: "no model available to checkpoint".to_string(),
        })?;

        let mut metadata = HashMap::from([("epoch".to_string(), (ctx.epoch + 1).to_string())]);
        if let Some(value) = monitored {
            metadata.insert(self.monitor.clone(), value.to_string());
        }
        save_state_dict(&path, &model.state_dict(), metadata)?;
        debug!(path = %path.display(), "checkpoint written");

        // an overwritten file moves to the back of the queue
        self.saved.retain(|p| p != &path);
        if self.max_save > 0 {
            while self.saved.len() >= self.max_save {
                if let Some(oldest) = self.saved.pop_front() {
                    std::fs::remove_file(&oldest)?;
                }
            }
        }
        self.saved.push_back(path);
        Ok(())
    }
}

impl TrainerCallback for ModelCheckpoint {
    fn on_train_begin(&mut self, _ctx: &CallbackContext) -> Result<CallbackAction> {
        self.best = self.mode.resolve(&self.monitor).worst();
        self.epochs_since_last_save = 0;
        Ok(CallbackAction::Continue)
    }

    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
        self.epochs_since_last_save += 1;
        if self.epochs_since_last_save < self.period {
            return Ok(CallbackAction::Continue);
        }
        self.epochs_since_last_save = 0;

        let current = ctx.logs.get(&self.monitor).copied();
        if !self.save_best_only {
            self.save(ctx, current)?;
            return Ok(CallbackAction::Continue);
        }

        match current {
            None => warn!(
                monitor = %self.monitor,
                "can save best model only with the monitored value available, skipping"
            ),
            Some(value) if self.mode.resolve(&self.monitor).improved(value, self.best, 0.0) => {
                info!(
                    epoch = ctx.epoch + 1,
                    monitor = %self.monitor,
                    from = self.best,
                    to = value,
                    "monitored value improved, saving model"
                );
                self.best = value;
                self.save(ctx, current)?;
            }
            Some(_) => debug!(epoch = ctx.epoch + 1, monitor = %self.monitor, "no improvement"),
        }
        Ok(CallbackAction::Continue)
    }

    fn name(&self) -> &'static str {
        "ModelCheckpoint"
    }
}
