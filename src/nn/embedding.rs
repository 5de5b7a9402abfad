//! Lookup table mapping integer codes to dense vectors

use super::init::normal;
use super::Module;
use crate::autograd::{embedding, embedding_bag_sum, Tensor};
use crate::error::{Error, Result};
use ndarray::Array2;
use rand::Rng;

/// Embedding table of `num_embeddings x dim`
///
/// The row at `padding_idx` starts at zero and never receives gradient.
pub struct Embedding {
    weight: Tensor,
    num_embeddings: usize,
    dim: usize,
    padding_idx: Option<usize>,
}

impl Embedding {
    /// Standard-normal initialized table
    pub fn new<R: Rng>(
        num_embeddings: usize,
        dim: usize,
        padding_idx: Option<usize>,
        rng: &mut R,
    ) -> Self {
        let mut data = normal(num_embeddings * dim, 1.0, rng);
        if let Some(pad) = padding_idx.filter(|&p| p < num_embeddings) {
            data.slice_mut(ndarray::s![pad * dim..(pad + 1) * dim]).fill(0.0);
        }
        Self {
            weight: Tensor::new(data, true),
            num_embeddings,
            dim,
            padding_idx,
        }
    }

    /// Table initialized from an existing matrix
    pub fn from_pretrained(
        matrix: &Array2<f32>,
        padding_idx: Option<usize>,
        trainable: bool,
    ) -> Result<Self> {
        let (num_embeddings, dim) = matrix.dim();
        if num_embeddings == 0 || dim == 0 {
            return Err(Error::InvalidConfig("embedding matrix is empty".into()));
        }
        let data = matrix.iter().copied().collect::<Vec<f32>>();
        Ok(Self {
            weight: Tensor::from_vec(data, trainable),
            num_embeddings,
            dim,
            padding_idx,
        })
    }

    pub fn num_embeddings(&self) -> usize {
        self.num_embeddings
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    /// Row `idx` of the table
    pub fn row(&self, idx: usize) -> Option<Vec<f32>> {
        if idx >= self.num_embeddings {
            return None;
        }
        let data = self.weight.data();
        let row = data.as_slice().expect("contiguous")[idx * self.dim..(idx + 1) * self.dim].to_vec();
        Some(row)
    }

    /// Look up `indices`, producing `(indices.len() x dim)`
    pub fn forward(&self, indices: &[usize]) -> Result<Tensor> {
        self.check(indices)?;
        Ok(embedding(&self.weight, indices, self.dim, self.padding_idx))
    }

    /// Sum the embeddings of each row of a `(rows x cols)` index matrix
    pub fn forward_bag(&self, indices: &[usize], rows: usize, cols: usize) -> Result<Tensor> {
        self.check(indices)?;
        Ok(embedding_bag_sum(&self.weight, indices, rows, cols, self.dim, self.padding_idx))
    }

    fn check(&self, indices: &[usize]) -> Result<()> {
        match indices.iter().find(|&&i| i >= self.num_embeddings) {
            Some(&bad) => Err(Error::shape(
                format!("embedding index {bad}"),
                [self.num_embeddings],
                [bad + 1],
            )),
            None => Ok(()),
        }
    }
}

impl Module for Embedding {
    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        if self.weight.requires_grad() {
            vec![("weight".to_string(), self.weight.clone())]
        } else {
            Vec::new()
        }
    }

    fn named_buffers(&self) -> Vec<(String, Tensor)> {
        if self.weight.requires_grad() {
            Vec::new()
        } else {
            vec![("weight".to_string(), self.weight.clone())]
        }
    }
}
