//! Per-component model inputs

use crate::error::{Error, Result};
use ndarray::{Array2, Array4, Axis};

/// Inputs for each model component, aligned by row
///
/// - `wide`: `(rows x n_wide_cols)` indices into the wide embedding (0 = padding)
/// - `deep`: `(rows x n_columns)` label-encoded categoricals and continuous values
/// - `text`: `(rows x maxlen)` token ids
/// - `image`: `(rows x channels x height x width)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelInput {
    pub wide: Option<Array2<usize>>,
    pub deep: Option<Array2<f32>>,
    pub text: Option<Array2<usize>>,
    pub image: Option<Array4<f32>>,
}

impl ModelInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wide(mut self, wide: Array2<usize>) -> Self {
        self.wide = Some(wide);
        self
    }

    pub fn with_deep(mut self, deep: Array2<f32>) -> Self {
        self.deep = Some(deep);
        self
    }

    pub fn with_text(mut self, text: Array2<usize>) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_image(mut self, image: Array4<f32>) -> Self {
        self.image = Some(image);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.wide.is_none() && self.deep.is_none() && self.text.is_none() && self.image.is_none()
    }

    /// Number of rows; every present input must agree
    pub fn num_rows(&self) -> Result<usize> {
        let counts = [
            ("wide", self.wide.as_ref().map(|a| a.nrows())),
            ("deep", self.deep.as_ref().map(|a| a.nrows())),
            ("text", self.text.as_ref().map(|a| a.nrows())),
            ("image", self.image.as_ref().map(|a| a.len_of(Axis(0)))),
        ];
        let mut rows: Option<usize> = None;
        for (name, count) in counts {
            match (rows, count) {
                (None, Some(n)) => rows = Some(n),
                (Some(expected), Some(n)) if n != expected => {
                    return Err(Error::shape(format!("{name} input rows"), [expected], [n]));
                }
                _ => {}
            }
        }
        rows.ok_or_else(|| Error::InvalidConfig("model input has no components".into()))
    }

    /// Rows at the given positions, for every present input
    pub fn select(&self, rows: &[usize]) -> Self {
        Self {
            wide: self.wide.as_ref().map(|a| a.select(Axis(0), rows)),
            deep: self.deep.as_ref().map(|a| a.select(Axis(0), rows)),
            text: self.text.as_ref().map(|a| a.select(Axis(0), rows)),
            image: self.image.as_ref().map(|a| a.select(Axis(0), rows)),
        }
    }
}
