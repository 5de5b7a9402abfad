//! Preparation of the deep dense component's input

use super::LabelEncoder;
use crate::data::Frame;
use crate::error::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label-encodes categorical columns and standardizes continuous ones
///
/// Output columns are the categorical columns (as codes) followed by the
/// continuous columns, in the order given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DensePreprocessor {
    embed_cols: Vec<(String, usize)>,
    continuous_cols: Vec<String>,
    scale: bool,
    encoder: Option<LabelEncoder>,
    /// `(mean, std)` per continuous column
    scaler: Option<Vec<(f64, f64)>>,
}

impl DensePreprocessor {
    /// `embed_cols` pairs each categorical column with its embedding width
    pub fn new(embed_cols: Vec<(String, usize)>, continuous_cols: Vec<String>) -> Self {
        Self {
            embed_cols,
            continuous_cols,
            scale: true,
            encoder: None,
            scaler: None,
        }
    }

    /// Standardize continuous columns (on by default)
    pub fn with_scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    pub fn fit(&mut self, frame: &Frame) -> Result<&mut Self> {
        if self.embed_cols.is_empty() && self.continuous_cols.is_empty() {
            return Err(Error::InvalidConfig("no deep columns given".into()));
        }
        let mut encoder =
            LabelEncoder::new(Some(self.embed_cols.iter().map(|(c, _)| c.clone()).collect()));
        encoder.fit(frame)?;

        let mut scaler = Vec::with_capacity(self.continuous_cols.len());
        for name in &self.continuous_cols {
            let values = frame.require(name)?.to_numbers(name)?;
            let n = values.len().max(1) as f64;
            let mean = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = if var > 0.0 { var.sqrt() } else { 1.0 };
            scaler.push((mean, std));
        }

        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        Ok(self)
    }

    pub fn transform(&self, frame: &Frame) -> Result<Array2<f32>> {
        let (encoder, scaler) = match (&self.encoder, &self.scaler) {
            (Some(e), Some(s)) => (e, s),
            _ => return Err(Error::NotFitted { what: "DensePreprocessor" }),
        };
        let rows = frame.num_rows();
        let mut out = Array2::zeros((rows, self.embed_cols.len() + self.continuous_cols.len()));

        for (c, (name, _)) in self.embed_cols.iter().enumerate() {
            for (r, value) in frame.require(name)?.to_strings().iter().enumerate() {
                out[[r, c]] = encoder.code(name, value) as f32;
            }
        }
        let offset = self.embed_cols.len();
        for (c, (name, &(mean, std))) in self.continuous_cols.iter().zip(scaler).enumerate() {
            for (r, v) in frame.require(name)?.to_numbers(name)?.into_iter().enumerate() {
                let v = if self.scale { (v - mean) / std } else { v };
                out[[r, offset + c]] = v as f32;
            }
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, frame: &Frame) -> Result<Array2<f32>> {
        self.fit(frame)?;
        self.transform(frame)
    }

    /// Column name to position in the output matrix
    pub fn column_idx(&self) -> BTreeMap<String, usize> {
        self.embed_cols
            .iter()
            .map(|(c, _)| c)
            .chain(&self.continuous_cols)
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect()
    }

    /// `(column, n_unique, embedding_dim)` for each categorical column
    pub fn embed_input(&self) -> Result<Vec<(String, usize, usize)>> {
        let encoder = self
            .encoder
            .as_ref()
            .ok_or(Error::NotFitted { what: "DensePreprocessor" })?;
        self.embed_cols
            .iter()
            .map(|(c, dim)| Ok((c.clone(), encoder.n_unique(c)?, *dim)))
            .collect()
    }

    pub fn continuous_cols(&self) -> &[String] {
        &self.continuous_cols
    }

    /// Encoder fitted on the categorical columns
    pub fn label_encoder(&self) -> Option<&LabelEncoder> {
        self.encoder.as_ref()
    }
}
