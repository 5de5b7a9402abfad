//! Loss functions for training
//!
//! - [`MSELoss`] - Mean Squared Error for regression
//! - [`BCEWithLogitsLoss`] - Binary classification on raw logits
//! - [`CrossEntropyLoss`] - Multiclass classification on raw logits

mod bce_with_logits;
mod cross_entropy;
mod mse;
mod traits;

pub use bce_with_logits::BCEWithLogitsLoss;
pub use cross_entropy::{softmax_rows, CrossEntropyLoss};
pub use mse::MSELoss;
pub use traits::LossFn;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_names() {
        assert_eq!(MSELoss.name(), "MSE");
        assert_eq!(CrossEntropyLoss.name(), "CrossEntropy");
        assert_eq!(BCEWithLogitsLoss.name(), "BCEWithLogits");
    }
}
