//! Inverted dropout

use super::Module;
use crate::autograd::{mul, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::{Cell, RefCell};

/// Zeroes elements with probability `p` during training and rescales the rest
/// by `1 / (1 - p)`; the identity in evaluation mode.
pub struct Dropout {
    p: f32,
    training: Cell<bool>,
    rng: RefCell<StdRng>,
}

impl Dropout {
    pub fn new<R: Rng>(p: f32, rng: &mut R) -> Self {
        Self {
            p: p.clamp(0.0, 1.0),
            training: Cell::new(true),
            rng: RefCell::new(StdRng::seed_from_u64(rng.random())),
        }
    }

    pub fn p(&self) -> f32 {
        self.p
    }

    pub fn forward(&self, x: &Tensor) -> Tensor {
        if !self.training.get() || self.p == 0.0 {
            return x.clone();
        }
        let keep = 1.0 - self.p;
        let mut rng = self.rng.borrow_mut();
        let mask: Vec<f32> = (0..x.len())
            .map(|_| {
                if keep > 0.0 && rng.random::<f32>() < keep {
                    1.0 / keep
                } else {
                    0.0
                }
            })
            .collect();
        mul(x, &Tensor::from_vec(mask, false))
    }
}

impl Module for Dropout {
    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        Vec::new()
    }

    fn set_training(&self, training: bool) {
        self.training.set(training);
    }
}
