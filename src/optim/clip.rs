//! Gradient clipping utilities

use crate::Tensor;

/// Clip gradients by global norm
///
/// Computes the global norm of all gradients and scales them down if the norm
/// exceeds `max_norm`, preserving the relative magnitudes across parameters.
///
/// Algorithm:
/// 1. global_norm = sqrt(sum of all gradient squared norms)
/// 2. If global_norm > max_norm every gradient is multiplied by
///    max_norm / global_norm
///
/// Returns the global norm before clipping.
pub fn clip_grad_norm(params: &[Tensor], max_norm: f32) -> f32 {
    let total_norm_sq: f32 = params
        .iter()
        .filter_map(Tensor::grad)
        .map(|grad| grad.iter().map(|&g| g * g).sum::<f32>())
        .sum();
    let global_norm = total_norm_sq.sqrt();

    if global_norm > max_norm {
        let clip_coef = max_norm / global_norm;
        for param in params {
            if let Some(grad) = param.grad() {
                param.set_grad(grad * clip_coef);
            }
        }
    }

    global_norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    #[test]
    fn test_clip_grad_norm_scales_down() {
        let a = Tensor::from_vec(vec![0.0, 0.0], true);
        let b = Tensor::from_vec(vec![0.0], true);
        a.set_grad(arr1(&[3.0, 0.0]));
        b.set_grad(arr1(&[4.0]));

        let norm = clip_grad_norm(&[a.clone(), b.clone()], 1.0);

        assert_abs_diff_eq!(norm, 5.0, epsilon = 1e-6);
        let ga = a.grad().unwrap();
        let gb = b.grad().unwrap();
        assert_abs_diff_eq!(ga[0], 0.6, epsilon = 1e-6);
        assert_abs_diff_eq!(gb[0], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_clip_grad_norm_below_threshold_untouched() {
        let a = Tensor::from_vec(vec![0.0], true);
        a.set_grad(arr1(&[0.5]));
        let norm = clip_grad_norm(std::slice::from_ref(&a), 1.0);
        assert_abs_diff_eq!(norm, 0.5, epsilon = 1e-6);
        assert_eq!(a.grad().unwrap()[0], 0.5);
    }

    #[test]
    fn test_clip_grad_norm_ignores_missing_grads() {
        let a = Tensor::from_vec(vec![1.0], true);
        assert_eq!(clip_grad_norm(std::slice::from_ref(&a), 1.0), 0.0);
    }
}
