//! Inputs paired with targets, split and batched for training

use super::ModelInput;
use crate::error::{Error, Result};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// A mini-batch
#[derive(Debug, Clone)]
pub struct Batch {
    pub input: ModelInput,
    pub target: Array1<f32>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

/// Model inputs with one target per row
#[derive(Debug, Clone)]
pub struct WideDeepDataset {
    input: ModelInput,
    target: Array1<f32>,
}

impl WideDeepDataset {
    pub fn new(input: ModelInput, target: Array1<f32>) -> Result<Self> {
        let rows = input.num_rows()?;
        if rows != target.len() {
            return Err(Error::shape("target length", [rows], [target.len()]));
        }
        Ok(Self { input, target })
    }

    pub fn input(&self) -> &ModelInput {
        &self.input
    }

    pub fn target(&self) -> &Array1<f32> {
        &self.target
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Rows at the given positions
    pub fn subset(&self, rows: &[usize]) -> Self {
        Self {
            input: self.input.select(rows),
            target: rows.iter().map(|&r| self.target[r]).collect(),
        }
    }

    /// Random `(train, validation)` split
    ///
    /// The validation set holds `ceil(len * val_fraction)` rows.
    pub fn split(&self, val_fraction: f32, seed: u64) -> Result<(Self, Self)> {
        if !(val_fraction > 0.0 && val_fraction < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "validation fraction must be in (0, 1), got {val_fraction}"
            )));
        }
        let n = self.len();
        let n_val = ((n as f32) * val_fraction).ceil() as usize;
        if n_val == 0 || n_val >= n {
            return Err(Error::InvalidConfig(format!(
                "cannot split {n} rows with validation fraction {val_fraction}"
            )));
        }
        let mut rows: Vec<usize> = (0..n).collect();
        rows.shuffle(&mut StdRng::seed_from_u64(seed));
        let (val, train) = rows.split_at(n_val);
        Ok((self.subset(train), self.subset(val)))
    }

    /// Number of batches of `batch_size` (the last one may be smaller)
    pub fn num_batches(&self, batch_size: usize) -> usize {
        self.len().div_ceil(batch_size.max(1))
    }

    /// Mini-batches covering every row once
    pub fn batches<R: Rng>(&self, batch_size: usize, shuffle: bool, rng: &mut R) -> Vec<Batch> {
        let mut rows: Vec<usize> = (0..self.len()).collect();
        if shuffle {
            rows.shuffle(rng);
        }
        rows.chunks(batch_size.max(1))
            .map(|chunk| Batch {
                input: self.input.select(chunk),
                target: chunk.iter().map(|&r| self.target[r]).collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn dataset(n: usize) -> WideDeepDataset {
        let deep = Array2::from_shape_fn((n, 2), |(r, c)| (r * 2 + c) as f32);
        let target = Array1::from_iter((0..n).map(|r| r as f32));
        WideDeepDataset::new(ModelInput::new().with_deep(deep), target).unwrap()
    }

    #[test]
    fn test_target_length_checked() {
        let input = ModelInput::new().with_deep(Array2::zeros((3, 1)));
        assert!(WideDeepDataset::new(input, Array1::zeros(2)).is_err());
    }

    #[test]
    fn test_batches_cover_all_rows() {
        let ds = dataset(100);
        let batches = ds.batches(32, true, &mut StdRng::seed_from_u64(0));
        assert_eq!(batches.len(), 4);
        assert_eq!(ds.num_batches(32), 4);
        assert_eq!(batches[3].len(), 4);
        let mut seen: Vec<f32> = batches.iter().flat_map(|b| b.target.to_vec()).collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(seen, ds.target().to_vec());
    }

    #[test]
    fn test_batches_keep_rows_aligned() {
        let ds = dataset(10);
        for batch in ds.batches(3, true, &mut StdRng::seed_from_u64(1)) {
            let deep = batch.input.deep.unwrap();
            for (row, t) in deep.rows().into_iter().zip(batch.target.iter()) {
                assert_eq!(row[0], t * 2.0);
            }
        }
    }

    #[test]
    fn test_split_sizes_and_disjoint() {
        let ds = dataset(100);
        let (train, val) = ds.split(0.2, 42).unwrap();
        assert_eq!((train.len(), val.len()), (80, 20));
        let train_t = train.target().to_vec();
        assert!(val.target().iter().all(|t| !train_t.contains(t)));
    }

    #[test]
    fn test_split_is_seeded() {
        let ds = dataset(20);
        let (_, a) = ds.split(0.25, 7).unwrap();
        let (_, b) = ds.split(0.25, 7).unwrap();
        assert_eq!(a.target(), b.target());
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        assert!(dataset(10).split(0.0, 0).is_err());
        assert!(dataset(10).split(1.0, 0).is_err());
        assert!(dataset(1).split(0.5, 0).is_err());
    }
}
