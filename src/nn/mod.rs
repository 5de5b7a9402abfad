//! Neural network layers built on the autograd tensors
//!
//! Layers own their parameters as shared [`Tensor`](crate::Tensor) handles and
//! expose them through the [`Module`] trait. Forward passes take explicit
//! row counts, matching the shape-free autograd ops.

mod batchnorm;
mod conv;
mod dense_block;
mod dropout;
mod embedding;
pub mod init;
mod linear;
mod module;
mod rnn;

pub use batchnorm::BatchNorm1d;
pub use conv::Conv2d;
pub use dense_block::{DenseBlock, Mlp};
pub use dropout::Dropout;
pub use embedding::Embedding;
pub use linear::Linear;
pub use module::{prefixed, Module, StateDict};
pub use rnn::{Rnn, RnnType};
