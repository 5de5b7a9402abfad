//! Linear model over sparse categorical features

use crate::autograd::{add_bias, Tensor};
use crate::error::{Error, Result};
use crate::nn::init::{kaiming_uniform, rng_from_seed};
use crate::nn::{prefixed, Embedding, Module};
use ndarray::{s, Array2};
use rand::Rng;

/// Wide component: `y = sum_j W[x_j] + b`
///
/// Equivalent to a linear layer over one-hot encoded features, computed as an
/// embedding-bag lookup. Index 0 is padding and contributes nothing.
pub struct Wide {
    wide_linear: Embedding,
    bias: Tensor,
    wide_dim: usize,
    pred_dim: usize,
}

impl Wide {
    /// Wide component over `wide_dim` features with `pred_dim` outputs
    pub fn new(wide_dim: usize, pred_dim: usize) -> Self {
        Self::init(wide_dim, pred_dim, &mut rng_from_seed(None))
    }

    /// Reproducibly initialized wide component
    pub fn with_seed(wide_dim: usize, pred_dim: usize, seed: u64) -> Self {
        Self::init(wide_dim, pred_dim, &mut rng_from_seed(Some(seed)))
    }

    fn init<R: Rng>(wide_dim: usize, pred_dim: usize, rng: &mut R) -> Self {
        let wide_linear = Embedding::new(wide_dim + 1, pred_dim, Some(0), rng);
        let mut weight = kaiming_uniform((wide_dim + 1) * pred_dim, pred_dim, rng);
        weight.slice_mut(s![..pred_dim]).fill(0.0);
        wide_linear.weight().set_data(weight);
        let bias = Tensor::new(kaiming_uniform(pred_dim, pred_dim, rng), true);
        Self {
            wide_linear,
            bias,
            wide_dim,
            pred_dim,
        }
    }

    pub fn wide_dim(&self) -> usize {
        self.wide_dim
    }

    pub fn pred_dim(&self) -> usize {
        self.pred_dim
    }

    /// `(rows x pred_dim)` output for a `(rows x cols)` index matrix
    pub fn forward(&self, x: &Array2<usize>) -> Result<Tensor> {
        let (rows, cols) = x.dim();
        let indices: Vec<usize> = x.iter().copied().collect();
        if let Some(&bad) = indices.iter().find(|&&i| i > self.wide_dim) {
            return Err(Error::shape("wide input index", [self.wide_dim], [bad]));
        }
        let out = self.wide_linear.forward_bag(&indices, rows, cols)?;
        Ok(add_bias(&out, &self.bias, rows, self.pred_dim))
    }
}

impl Module for Wide {
    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        let mut named = prefixed("wide_linear", self.wide_linear.named_parameters());
        named.push(("bias".to_string(), self.bias.clone()));
        named
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, array};

    #[test]
    fn test_forward_sums_rows_plus_bias() {
        let wide = Wide::with_seed(3, 1, 0);
        wide.wide_linear.weight().set_data(arr1(&[0.0, 1.0, 2.0, 4.0]));
        wide.bias.set_data(arr1(&[0.5]));
        let out = wide.forward(&array![[1, 3], [2, 0]]).unwrap();
        assert_eq!(out.to_vec(), vec![5.5, 2.5]);
    }

    #[test]
    fn test_padding_row_starts_at_zero() {
        let wide = Wide::with_seed(4, 2, 1);
        assert_eq!(wide.wide_linear.row(0).unwrap(), vec![0.0, 0.0]);
        assert_eq!(wide.num_parameters(), 5 * 2 + 2);
    }

    #[test]
    fn test_out_of_range_index() {
        let wide = Wide::with_seed(2, 1, 0);
        assert!(wide.forward(&array![[3]]).is_err());
    }
}
