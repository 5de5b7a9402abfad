//! Regression metrics

use crate::Tensor;

use super::Metric;

/// R² (coefficient of determination) for regression
///
/// R² = 1 - SS_res / SS_tot
///
/// Where:
/// - SS_res = sum((y - y_pred)²)
/// - SS_tot = sum((y - y_mean)²)
///
/// R² = 1.0 is perfect prediction, 0.0 means predicting the mean. Constant
/// targets score 1.0 when matched exactly and 0.0 otherwise.
///
/// # Example
///
/// ```
/// use widedeep::train::{R2Score, Metric};
/// use widedeep::Tensor;
///
/// let metric = R2Score;
/// let pred = Tensor::from_vec(vec![1.0, 2.0, 3.0], false);
/// let target = Tensor::from_vec(vec![1.0, 2.0, 3.0], false);
///
/// assert!((metric.compute(&pred, &target) - 1.0).abs() < 1e-5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct R2Score;

impl Metric for R2Score {
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32 {
        assert_eq!(predictions.len(), targets.len());

        if predictions.is_empty() {
            return 0.0;
        }

        let y_pred = predictions.data();
        let y_true = targets.data();
        let mean = y_true.mean().unwrap_or(0.0);
        let ss_res: f32 = y_true.iter().zip(y_pred.iter()).map(|(&t, &p)| (t - p).powi(2)).sum();
        let ss_tot: f32 = y_true.iter().map(|&t| (t - mean).powi(2)).sum();

        if ss_tot == 0.0 {
            return if ss_res == 0.0 { 1.0 } else { 0.0 };
        }
        1.0 - ss_res / ss_tot
    }

    fn name(&self) -> &'static str {
        "r2"
    }
}
