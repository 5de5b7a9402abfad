//! Wide & deep model components
//!
//! [`Wide`] is a linear model over sparse indices; [`DeepDense`],
//! [`DeepText`] and [`DeepImage`] are the deep sub-networks. [`WideDeep`]
//! combines them into one model producing `pred_dim` outputs per row.

mod deep_dense;
mod deep_image;
mod deep_text;
mod wide;
mod wide_deep;

pub use deep_dense::{DeepDense, DeepDenseBuilder};
pub use deep_image::{DeepImage, DeepImageBuilder};
pub use deep_text::{DeepText, DeepTextBuilder};
pub use wide::Wide;
pub use wide_deep::{WideDeep, WideDeepBuilder, COMPONENTS};
