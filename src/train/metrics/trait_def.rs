//! Core Metric trait definition

use crate::Tensor;

/// Trait for evaluation metrics
///
/// Predictions are what `Trainer::predict_proba` returns for classification
/// and raw outputs for regression.
pub trait Metric {
    /// Compute the metric given predictions and targets
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32;

    /// Short name used in log keys (`train_<name>`, `val_<name>`)
    fn name(&self) -> &'static str;

    /// Whether higher values are better (true) or lower (false)
    fn higher_is_better(&self) -> bool {
        true
    }
}
