//! Cross Entropy Loss for multiclass classification

use super::traits::scalar_loss;
use super::LossFn;
use crate::Tensor;
use ndarray::Array1;

/// Row-wise softmax of a row-major `(rows x cols)` matrix
pub fn softmax_rows(logits: &[f32], cols: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(logits.len());
    for row in logits.chunks(cols.max(1)) {
        let max = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let exp: Vec<f32> = row.iter().map(|&v| (v - max).exp()).collect();
        let sum: f32 = exp.iter().sum();
        out.extend(exp.into_iter().map(|e| e / sum));
    }
    out
}

/// Cross Entropy Loss
///
/// Predictions are `(rows x n_classes)` logits and targets hold one class
/// index per row. L = mean over rows of -log(softmax(logits)[target]).
///
/// # Example
///
/// ```
/// use widedeep::train::{CrossEntropyLoss, LossFn};
/// use widedeep::Tensor;
///
/// let loss_fn = CrossEntropyLoss;
/// let logits = Tensor::from_vec(vec![2.0, 1.0, 0.5], true);
/// let targets = Tensor::from_vec(vec![0.0], false);
///
/// let loss = loss_fn.forward(&logits, &targets);
/// assert!(loss.item() > 0.0);
/// ```
pub struct CrossEntropyLoss;

impl LossFn for CrossEntropyLoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        let rows = targets.len();
        assert!(
            rows > 0 && predictions.len() % rows == 0,
            "Predictions must hold one row of logits per target"
        );
        let cols = predictions.len() / rows;

        let probs = softmax_rows(predictions.data().as_slice().expect("contiguous"), cols);
        let mut grad = Array1::from(probs);
        let mut total = 0.0f32;

        for (r, &t) in targets.data().iter().enumerate() {
            let class = t as usize;
            assert!(class < cols, "class index {class} out of range for {cols} classes");
            let i = r * cols + class;
            total -= grad[i].max(f32::MIN_POSITIVE).ln();
            // d(CE)/d(logits) = probs - one_hot
            grad[i] -= 1.0;
        }

        let n = rows as f32;
        grad /= n;
        scalar_loss(total / n, predictions, grad)
    }

    fn name(&self) -> &'static str {
        "CrossEntropy"
    }
}
