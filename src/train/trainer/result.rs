//! Training result types

/// Result of a training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainResult {
    /// Number of epochs completed
    pub epochs_run: usize,
    /// Mean training loss of the last epoch
    pub final_loss: f32,
    /// Best validation loss, or best training loss without validation
    pub best_loss: f32,
    /// Whether a callback stopped training before `n_epochs`
    pub stopped_early: bool,
    /// Optimizer steps taken
    pub steps: usize,
    /// Total training time in seconds
    pub elapsed_secs: f64,
}
