//! Autograd operations with backward passes
//!
//! This module provides differentiable operations for automatic differentiation.

mod activations;
mod basic;
mod conv;
mod indexing;
mod matmul;
mod normalize;

// Re-export all public operations
pub use activations::{leaky_relu, relu, sigmoid, sigmoid_scalar, tanh};
pub use basic::{add, add_bias, mean, mul, scale, sub, sum};
pub use conv::{conv2d, global_avg_pool2d, max_pool2d, Conv2dShape};
pub use indexing::{concat_cols, embedding, embedding_bag_sum, slice_cols};
pub use matmul::{matmul, matmul_compute, transpose};
pub use normalize::{batch_norm, BatchNormOutput, NormStats};
