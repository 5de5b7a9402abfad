//! Tabular frames, model inputs and datasets

mod dataset;
mod frame;
mod input;

pub use dataset::{Batch, WideDeepDataset};
pub use frame::{Column, Frame};
pub use input::ModelInput;
