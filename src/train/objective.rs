//! Training objectives: loss selection and output activation

use super::loss::{softmax_rows, BCEWithLogitsLoss, CrossEntropyLoss, LossFn, MSELoss};
use crate::autograd::sigmoid_scalar;
use crate::{Error, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// What the model is trained to predict
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Real-valued target, MSE loss, identity output
    Regression,
    /// 0/1 target, BCE on logits, sigmoid output
    Binary,
    /// Class index target in `0..n`, cross-entropy on logits, softmax output
    Multiclass(usize),
}

impl Objective {
    /// Output width the model needs
    pub fn pred_dim(&self) -> usize {
        match self {
            Self::Regression | Self::Binary => 1,
            Self::Multiclass(n) => *n,
        }
    }

    pub fn loss(&self) -> Box<dyn LossFn> {
        match self {
            Self::Regression => Box::new(MSELoss),
            Self::Binary => Box::new(BCEWithLogitsLoss),
            Self::Multiclass(_) => Box::new(CrossEntropyLoss),
        }
    }

    /// Raw model outputs mapped to predictions or class probabilities
    pub fn activate(&self, outputs: &[f32]) -> Vec<f32> {
        match self {
            Self::Regression => outputs.to_vec(),
            Self::Binary => outputs.iter().map(|&x| sigmoid_scalar(x)).collect(),
            Self::Multiclass(n) => softmax_rows(outputs, *n),
        }
    }

    /// Reject targets the loss cannot consume
    pub fn validate_targets(&self, target: &Array1<f32>) -> Result<()> {
        let bad = match self {
            Self::Regression => target.iter().find(|t| !t.is_finite()),
            Self::Binary => target.iter().find(|&&t| !(0.0..=1.0).contains(&t)),
            Self::Multiclass(n) => target
                .iter()
                .find(|&&t| t < 0.0 || t.fract() != 0.0 || t as usize >= *n),
        };
        match bad {
            Some(t) => Err(Error::InvalidConfig(format!(
                "target value {t} is not valid for a {self:?} objective"
            ))),
            None => Ok(()),
        }
    }

    /// Hard predictions from activated outputs: values for regression, labels otherwise
    pub fn decide(&self, activated: &[f32]) -> Array1<f32> {
        match self {
            Self::Regression => Array1::from(activated.to_vec()),
            Self::Binary => activated.iter().map(|&p| if p >= 0.5 { 1.0 } else { 0.0 }).collect(),
            Self::Multiclass(n) => activated
                .chunks(*n)
                .map(|row| {
                    let mut best = 0;
                    for (i, &p) in row.iter().enumerate() {
                        if p > row[best] {
                            best = i;
                        }
                    }
                    best as f32
                })
                .collect(),
        }
    }

    /// Class probabilities `(rows x classes)`; binary yields `[1 - p, p]` rows
    pub fn probabilities(&self, activated: &[f32]) -> Result<Array2<f32>> {
        match self {
            Self::Regression => Err(Error::InvalidConfig(
                "class probabilities are undefined for regression".into(),
            )),
            Self::Binary => {
                let rows = activated.len();
                let data: Vec<f32> = activated.iter().flat_map(|&p| [1.0 - p, p]).collect();
                Array2::from_shape_vec((rows, 2), data)
                    .map_err(|e| Error::InvalidConfig(e.to_string()))
            }
            Self::Multiclass(n) => {
                Array2::from_shape_vec((activated.len() / n, *n), activated.to_vec())
                    .map_err(|e| Error::InvalidConfig(e.to_string()))
            }
        }
    }
}
