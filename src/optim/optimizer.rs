//! Optimizer trait

use crate::Tensor;
use ndarray::Array1;

/// Trait for optimization algorithms
///
/// Optimizers keep per-parameter state by position, so every call to
/// [`Optimizer::step`] must pass the parameters in the same order.
pub trait Optimizer {
    /// Perform a single optimization step using the accumulated gradients
    fn step(&mut self, params: &[Tensor]);

    /// Zero out all gradients
    fn zero_grad(&mut self, params: &[Tensor]) {
        for param in params {
            param.zero_grad();
        }
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);

    /// Short identifier used in logs
    fn name(&self) -> &'static str;
}

/// Gradient with L2 weight decay folded in
pub(crate) fn decayed_grad(param: &Tensor, grad: Array1<f32>, weight_decay: f32) -> Array1<f32> {
    if weight_decay == 0.0 {
        grad
    } else {
        grad + &(&*param.data() * weight_decay)
    }
}

/// Grow a per-parameter state vector to cover `len` parameters
pub(crate) fn ensure_len(state: &mut Vec<Option<Array1<f32>>>, len: usize) {
    if state.len() < len {
        state.resize(len, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    /// Minimal optimizer for exercising the default methods
    struct TestOptimizer {
        learning_rate: f32,
    }

    impl Optimizer for TestOptimizer {
        fn step(&mut self, params: &[Tensor]) {
            for param in params {
                if let Some(grad) = param.grad() {
                    let updated = &*param.data() - &(grad * self.learning_rate);
                    param.set_data(updated);
                }
            }
        }

        fn lr(&self) -> f32 {
            self.learning_rate
        }

        fn set_lr(&mut self, lr: f32) {
            self.learning_rate = lr;
        }

        fn name(&self) -> &'static str {
            "test"
        }
    }

    #[test]
    fn test_zero_grad_clears_every_param() {
        let mut opt = TestOptimizer { learning_rate: 0.1 };
        let params = vec![Tensor::from_vec(vec![1.0, 2.0], true), Tensor::from_vec(vec![3.0], true)];
        params[0].set_grad(arr1(&[0.5, 1.0]));
        params[1].set_grad(arr1(&[1.5]));

        opt.zero_grad(&params);

        for p in &params {
            assert!(p.grad().is_none());
        }
    }

    #[test]
    fn test_set_lr() {
        let mut opt = TestOptimizer { learning_rate: 0.1 };
        opt.set_lr(0.01);
        assert_eq!(opt.lr(), 0.01);
    }

    #[test]
    fn test_decayed_grad() {
        let p = Tensor::from_vec(vec![2.0, -4.0], true);
        let g = decayed_grad(&p, arr1(&[1.0, 1.0]), 0.5);
        assert_eq!(g.to_vec(), vec![2.0, -1.0]);
        assert_eq!(decayed_grad(&p, arr1(&[1.0, 1.0]), 0.0).to_vec(), vec![1.0, 1.0]);
    }
}
