//! Fully-connected layer: `y = x W + b`

use super::init::kaiming_uniform;
use super::Module;
use crate::autograd::{add_bias, matmul, Tensor};
use rand::Rng;

/// Dense layer mapping `(rows x in_features)` to `(rows x out_features)`
///
/// The weight is stored `(in_features x out_features)` so the forward pass is
/// a plain matmul.
pub struct Linear {
    weight: Tensor,
    bias: Tensor,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// Kaiming-uniform initialized layer
    pub fn new<R: Rng>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        let len = in_features * out_features;
        Self {
            weight: Tensor::new(kaiming_uniform(len, in_features, rng), true),
            bias: Tensor::new(kaiming_uniform(out_features, in_features, rng), true),
            in_features,
            out_features,
        }
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }

    pub fn forward(&self, x: &Tensor, rows: usize) -> Tensor {
        let out = matmul(x, &self.weight, rows, self.in_features, self.out_features);
        add_bias(&out, &self.bias, rows, self.out_features)
    }
}

impl Module for Linear {
    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        vec![
            ("weight".to_string(), self.weight.clone()),
            ("bias".to_string(), self.bias.clone()),
        ]
    }
}
