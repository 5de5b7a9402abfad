//! Mean Squared Error loss

use super::traits::scalar_loss;
use super::LossFn;
use crate::Tensor;

/// Mean Squared Error Loss
///
/// L = mean((predictions - targets)^2)
///
/// # Example
///
/// ```
/// use widedeep::train::{MSELoss, LossFn};
/// use widedeep::Tensor;
///
/// let loss_fn = MSELoss;
/// let pred = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
/// let target = Tensor::from_vec(vec![1.5, 2.5, 3.5], false);
///
/// let loss = loss_fn.forward(&pred, &target);
/// assert!((loss.item() - 0.25).abs() < 1e-6);
/// ```
pub struct MSELoss;

impl LossFn for MSELoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_eq!(
            predictions.len(),
            targets.len(),
            "Predictions and targets must have same length"
        );

        let diff = &*predictions.data() - &*targets.data();
        let mse = (&diff * &diff).mean().unwrap_or(0.0);

        // d(MSE)/d(pred) = 2 * (pred - target) / n
        let n = predictions.len().max(1) as f32;
        let grad = diff * (2.0 / n);

        scalar_loss(mse, predictions, grad)
    }

    fn name(&self) -> &'static str {
        "MSE"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mse_gradient() {
        let pred = Tensor::from_vec(vec![1.0, 3.0], true);
        let target = Tensor::from_vec(vec![0.0, 1.0], false);
        let loss = MSELoss.forward(&pred, &target);
        assert_relative_eq!(loss.item(), 2.5, epsilon = 1e-6);

        loss.backward();
        let grad = pred.grad().unwrap();
        assert_relative_eq!(grad[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(grad[1], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mse_zero_when_equal() {
        let pred = Tensor::from_vec(vec![0.3, -0.2], false);
        let loss = MSELoss.forward(&pred, &pred.detach());
        assert_eq!(loss.item(), 0.0);
        assert!(!loss.requires_grad());
    }
}
