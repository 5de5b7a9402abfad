//! Binary Cross-Entropy with Logits Loss
//!
//! Combines a sigmoid activation with binary cross-entropy loss.
//!
//! # Formula
//!
//! Numerically stable computation:
//! ```text
//! L_i = max(x_i, 0) - x_i * t_i + log(1 + exp(-|x_i|))
//! L = mean(L_i) over all i
//! ```
//!
//! Gradient: `∂L/∂x_i = (σ(x_i) - t_i) / N`

use super::traits::scalar_loss;
use super::LossFn;
use crate::autograd::sigmoid_scalar;
use crate::Tensor;

/// Binary Cross-Entropy with Logits Loss
///
/// # Example
///
/// ```
/// use widedeep::train::{BCEWithLogitsLoss, LossFn};
/// use widedeep::Tensor;
///
/// let loss_fn = BCEWithLogitsLoss;
/// let logits = Tensor::from_vec(vec![2.0, -1.0, 0.5], true);
/// let targets = Tensor::from_vec(vec![1.0, 0.0, 1.0], false);
///
/// let loss = loss_fn.forward(&logits, &targets);
/// assert!(loss.item() > 0.0);
/// ```
pub struct BCEWithLogitsLoss;

impl BCEWithLogitsLoss {
    /// Numerically stable BCE: max(x, 0) - x*t + log(1 + exp(-|x|))
    fn stable_bce(logit: f32, target: f32) -> f32 {
        logit.max(0.0) - logit * target + (-logit.abs()).exp().ln_1p()
    }
}

impl LossFn for BCEWithLogitsLoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_eq!(
            predictions.len(),
            targets.len(),
            "Predictions and targets must have same length"
        );

        let n = predictions.len().max(1) as f32;
        let logits = predictions.data();
        let targets = targets.data();

        let total: f32 = logits
            .iter()
            .zip(targets.iter())
            .map(|(&logit, &target)| Self::stable_bce(logit, target))
            .sum::<f32>()
            / n;

        let mut grad = logits.mapv(sigmoid_scalar);
        grad -= &*targets;
        grad /= n;
        drop(logits);

        scalar_loss(total, predictions, grad)
    }

    fn name(&self) -> &'static str {
        "BCEWithLogits"
    }
}
