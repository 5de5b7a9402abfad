//! Loss function trait

use crate::autograd::tensor::GradCell;
use crate::autograd::BackwardOp;
use crate::Tensor;
use ndarray::Array1;
use std::rc::Rc;

/// Trait for loss functions
pub trait LossFn {
    /// Compute loss given predictions and targets
    ///
    /// Returns a scalar loss tensor wired for backpropagation into
    /// `predictions`.
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor;

    /// Name of the loss function
    fn name(&self) -> &'static str;
}

/// Scalar loss whose gradient w.r.t. the predictions is known up front
pub(crate) fn scalar_loss(value: f32, predictions: &Tensor, grad: Array1<f32>) -> Tensor {
    let requires_grad = predictions.requires_grad();
    let mut loss = Tensor::from_vec(vec![value], requires_grad);

    if requires_grad {
        let op = Rc::new(LossBackward {
            predictions: predictions.clone(),
            grad,
            result_grad: loss.grad_cell(),
        });
        loss.set_backward_op(op);
    }

    loss
}

struct LossBackward {
    predictions: Tensor,
    grad: Array1<f32>,
    result_grad: GradCell,
}

impl BackwardOp for LossBackward {
    fn backward(&self) {
        if let Some(upstream) = self.result_grad.borrow().as_ref() {
            self.predictions.accumulate_grad(&self.grad * upstream[0]);
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.predictions.clone()]
    }
}
