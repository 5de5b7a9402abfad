//! Inference on new inputs

use super::core::Trainer;
use crate::data::ModelInput;
use crate::nn::Module;
use crate::Result;
use ndarray::{Array1, Array2};

/// Rows per forward pass at inference
const PREDICT_BATCH: usize = 256;

impl Trainer {
    /// Activated outputs for every row, computed in evaluation mode
    fn activated(&self, input: &ModelInput) -> Result<Vec<f32>> {
        let rows = input.num_rows()?;
        self.model.eval();
        let mut out = Vec::with_capacity(rows * self.objective.pred_dim());
        let all: Vec<usize> = (0..rows).collect();
        for chunk in all.chunks(PREDICT_BATCH) {
            let outputs = self.model.forward(&input.select(chunk))?;
            out.extend(self.objective.activate(outputs.data().as_slice().expect("contiguous")));
        }
        Ok(out)
    }

    /// Predicted values (regression) or class labels (classification)
    pub fn predict(&self, input: &ModelInput) -> Result<Array1<f32>> {
        Ok(self.objective.decide(&self.activated(input)?))
    }

    /// Class probabilities, `(rows x classes)`; binary problems give two columns
    pub fn predict_proba(&self, input: &ModelInput) -> Result<Array2<f32>> {
        self.objective.probabilities(&self.activated(input)?)
    }
}
