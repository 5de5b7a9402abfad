//! Preprocessors turning frames into model inputs
//!
//! All encoders reserve index 0 for unseen categories (and padding), so the
//! embedding layers fed by them use `padding_idx = 0`.

mod dense;
mod label_encoder;
mod text;
mod wide;

pub use dense::DensePreprocessor;
pub use label_encoder::{LabelEncoder, UNSEEN};
pub use text::{TextPreprocessor, PAD_TOKEN, UNK_TOKEN};
pub use wide::WidePreprocessor;
