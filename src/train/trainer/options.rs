//! Options of a single `fit` run

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// How a `fit` call iterates over the data
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Maximum number of epochs
    pub n_epochs: usize,
    pub batch_size: usize,
    /// Fraction of rows held out for validation by [`fit`](super::Trainer::fit); 0 disables it
    pub val_split: f32,
    /// Validate every this many epochs
    pub validation_freq: usize,
    /// Seed for the validation split and batch shuffling
    pub seed: u64,
    pub shuffle: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { n_epochs: 1, batch_size: 32, val_split: 0.0, validation_freq: 1, seed: 1, shuffle: true }
    }
}

impl FitOptions {
    pub fn with_epochs(mut self, n_epochs: usize) -> Self {
        self.n_epochs = n_epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_val_split(mut self, val_split: f32) -> Self {
        self.val_split = val_split;
        self
    }

    pub fn with_validation_freq(mut self, validation_freq: usize) -> Self {
        self.validation_freq = validation_freq;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be positive".into()));
        }
        if self.validation_freq == 0 {
            return Err(Error::InvalidConfig("validation_freq must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.val_split) {
            return Err(Error::InvalidConfig(format!(
                "val_split must be in [0, 1), got {}",
                self.val_split
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let opts = FitOptions::default();
        assert!(opts.validate().is_ok());
        assert_eq!(opts.batch_size, 32);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(FitOptions::default().with_batch_size(0).validate().is_err());
        assert!(FitOptions::default().with_validation_freq(0).validate().is_err());
        assert!(FitOptions::default().with_val_split(1.0).validate().is_err());
        assert!(FitOptions::default().with_val_split(-0.1).validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let opts: FitOptions = serde_yaml::from_str("n_epochs: 5\nval_split: 0.2").unwrap();
        assert_eq!(opts.n_epochs, 5);
        assert_eq!(opts.batch_size, 32);
        assert!(opts.shuffle);
    }
}
