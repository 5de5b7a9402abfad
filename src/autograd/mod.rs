//! Tape-based autograd engine
//!
//! Provides automatic differentiation over flat `f32` tensors. Every operation
//! records a [`BackwardOp`] on its result; [`Tensor::backward`] walks the graph
//! in reverse topological order so that intermediate values shared by several
//! consumers receive the sum of their partial gradients exactly once.
//!
//! Shapes are not stored on tensors. Operations take their dimensions
//! explicitly (`matmul(a, b, m, k, n)`), row-major throughout.

mod backward;
mod ops;
pub(crate) mod tensor;

#[cfg(test)]
pub(crate) mod tests;

pub use backward::BackwardOp;
pub use ops::*;
pub use tensor::Tensor;
