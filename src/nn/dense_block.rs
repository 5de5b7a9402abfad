//! Fully-connected blocks and stacks of them

use super::{prefixed, BatchNorm1d, Dropout, Linear, Module};
use crate::autograd::{leaky_relu, Tensor};
use rand::Rng;

const LEAKY_SLOPE: f32 = 0.01;

/// `Linear -> LeakyReLU -> [BatchNorm1d] -> [Dropout]`
pub struct DenseBlock {
    linear: Linear,
    batchnorm: Option<BatchNorm1d>,
    dropout: Option<Dropout>,
}

impl DenseBlock {
    pub fn new<R: Rng>(
        in_features: usize,
        out_features: usize,
        dropout: f32,
        batchnorm: bool,
        rng: &mut R,
    ) -> Self {
        Self {
            linear: Linear::new(in_features, out_features, rng),
            batchnorm: batchnorm.then(|| BatchNorm1d::new(out_features)),
            dropout: (dropout > 0.0).then(|| Dropout::new(dropout, rng)),
        }
    }

    pub fn out_features(&self) -> usize {
        self.linear.out_features()
    }

    pub fn forward(&self, x: &Tensor, rows: usize) -> Tensor {
        let mut out = leaky_relu(&self.linear.forward(x, rows), LEAKY_SLOPE);
        if let Some(bn) = &self.batchnorm {
            out = bn.forward(&out, rows);
        }
        if let Some(dropout) = &self.dropout {
            out = dropout.forward(&out);
        }
        out
    }
}

impl Module for DenseBlock {
    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        let mut named = prefixed("linear", self.linear.named_parameters());
        if let Some(bn) = &self.batchnorm {
            named.extend(prefixed("bn", bn.named_parameters()));
        }
        named
    }

    fn named_buffers(&self) -> Vec<(String, Tensor)> {
        self.batchnorm
            .as_ref()
            .map(|bn| prefixed("bn", bn.named_buffers()))
            .unwrap_or_default()
    }

    fn set_training(&self, training: bool) {
        if let Some(bn) = &self.batchnorm {
            bn.set_training(training);
        }
        if let Some(dropout) = &self.dropout {
            dropout.set_training(training);
        }
    }
}

/// Sequence of [`DenseBlock`]s
///
/// `dropout` gives one rate per block; a shorter list leaves the remaining
/// blocks without dropout.
pub struct Mlp {
    blocks: Vec<DenseBlock>,
    input_dim: usize,
}

impl Mlp {
    pub fn new<R: Rng>(
        input_dim: usize,
        hidden: &[usize],
        dropout: &[f32],
        batchnorm: bool,
        rng: &mut R,
    ) -> Self {
        let mut blocks = Vec::with_capacity(hidden.len());
        let mut in_features = input_dim;
        for (i, &out_features) in hidden.iter().enumerate() {
            let p = dropout.get(i).copied().unwrap_or(0.0);
            blocks.push(DenseBlock::new(in_features, out_features, p, batchnorm, rng));
            in_features = out_features;
        }
        Self { blocks, input_dim }
    }

    /// Width of the last block, or the input width when empty
    pub fn output_dim(&self) -> usize {
        self.blocks.last().map_or(self.input_dim, DenseBlock::out_features)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn forward(&self, x: &Tensor, rows: usize) -> Tensor {
        self.blocks
            .iter()
            .fold(x.clone(), |out, block| block.forward(&out, rows))
    }
}

impl Module for Mlp {
    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        self.blocks
            .iter()
            .enumerate()
            .flat_map(|(i, b)| prefixed(&format!("dense_layer_{i}"), b.named_parameters()))
            .collect()
    }

    fn named_buffers(&self) -> Vec<(String, Tensor)> {
        self.blocks
            .iter()
            .enumerate()
            .flat_map(|(i, b)| prefixed(&format!("dense_layer_{i}"), b.named_buffers()))
            .collect()
    }

    fn set_training(&self, training: bool) {
        for block in &self.blocks {
            block.set_training(training);
        }
    }
}
