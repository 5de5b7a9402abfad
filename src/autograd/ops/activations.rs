//! Activation function autograd operations: relu, leaky_relu, sigmoid, tanh

use crate::autograd::tensor::GradCell;
use crate::autograd::{BackwardOp, Tensor};
use ndarray::{Array1, Zip};
use std::rc::Rc;

/// Numerically stable logistic function
#[inline]
pub fn sigmoid_scalar(v: f32) -> f32 {
    if v >= 0.0 {
        1.0 / (1.0 + (-v).exp())
    } else {
        let e = v.exp();
        e / (1.0 + e)
    }
}

#[derive(Clone, Copy)]
enum Activation {
    Relu,
    LeakyRelu(f32),
    Sigmoid,
    Tanh,
}

impl Activation {
    fn forward(self, x: f32) -> f32 {
        match self {
            Self::Relu => x.max(0.0),
            Self::LeakyRelu(slope) => {
                if x > 0.0 {
                    x
                } else {
                    slope * x
                }
            }
            Self::Sigmoid => sigmoid_scalar(x),
            Self::Tanh => x.tanh(),
        }
    }

    /// Derivative expressed through the input `x` and output `y`
    fn derivative(self, x: f32, y: f32) -> f32 {
        match self {
            Self::Relu => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::LeakyRelu(slope) => {
                if x > 0.0 {
                    1.0
                } else {
                    slope
                }
            }
            Self::Sigmoid => y * (1.0 - y),
            Self::Tanh => 1.0 - y * y,
        }
    }
}

/// ReLU activation
pub fn relu(a: &Tensor) -> Tensor {
    activate(a, Activation::Relu)
}

/// Leaky ReLU activation with the given negative slope
pub fn leaky_relu(a: &Tensor, negative_slope: f32) -> Tensor {
    activate(a, Activation::LeakyRelu(negative_slope))
}

/// Sigmoid activation
pub fn sigmoid(a: &Tensor) -> Tensor {
    activate(a, Activation::Sigmoid)
}

/// Hyperbolic tangent activation
pub fn tanh(a: &Tensor) -> Tensor {
    activate(a, Activation::Tanh)
}

fn activate(a: &Tensor, kind: Activation) -> Tensor {
    let data = a.data().mapv(|x| kind.forward(x));
    let requires_grad = a.requires_grad();
    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let op = Rc::new(ActivationBackward {
            a: a.clone(),
            output: result.data().clone(),
            kind,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(op);
    }

    result
}

struct ActivationBackward {
    a: Tensor,
    output: Array1<f32>,
    kind: Activation,
    result_grad: GradCell,
}

impl BackwardOp for ActivationBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                let input = self.a.data();
                let mut grad_a = Array1::zeros(grad.len());
                Zip::from(&mut grad_a)
                    .and(grad)
                    .and(&*input)
                    .and(&self.output)
                    .for_each(|ga, &g, &x, &y| *ga = g * self.kind.derivative(x, y));
                drop(input);
                self.a.accumulate_grad(grad_a);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}
