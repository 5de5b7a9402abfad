//! Evaluation metrics for training and validation
//!
//! - Classification: Accuracy, Precision, Recall, F1
//! - Regression: R²

mod classification;
mod regression;
mod trait_def;

#[cfg(test)]
mod tests;

pub use classification::{Accuracy, F1Score, Precision, Recall};
pub use regression::R2Score;
pub use trait_def::Metric;
