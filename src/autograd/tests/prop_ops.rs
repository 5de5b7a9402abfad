//! Property-based gradient checks

use super::test_utils::{assert_close, gradients};
use crate::autograd::*;
use proptest::prelude::*;

fn weighted_sum(t: &Tensor, weights: &[f32]) -> Tensor {
    sum(&mul(t, &Tensor::from_vec(weights.to_vec(), false)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_mul_gradient_is_other_operand(
        xy in prop::collection::vec((-5.0f32..5.0, -5.0f32..5.0), 1..16)
    ) {
        let (x, y): (Vec<f32>, Vec<f32>) = xy.into_iter().unzip();
        let a = Tensor::from_vec(x, true);
        let b = Tensor::from_vec(y.clone(), false);
        sum(&mul(&a, &b)).backward();
        prop_assert_eq!(a.grad().unwrap().to_vec(), y);
    }

    #[test]
    fn prop_tanh_gradient_matches_finite_difference(
        x in prop::collection::vec(-2.0f32..2.0, 1..12)
    ) {
        let weights: Vec<f32> = (0..x.len()).map(|i| 1.0 + i as f32 * 0.5).collect();
        let (a, n) = gradients(|t| weighted_sum(&tanh(t), &weights), &x);
        assert_close(&a, &n, 0.05);
    }

    #[test]
    fn prop_leaky_relu_gradient_away_from_kink(
        x in prop::collection::vec(prop_oneof![-3.0f32..-0.1, 0.1f32..3.0], 1..12)
    ) {
        let (a, n) = gradients(|t| sum(&leaky_relu(t, 0.01)), &x);
        assert_close(&a, &n, 0.05);
    }

    #[test]
    fn prop_matmul_gradient_matches_finite_difference(
        m in 1usize..4,
        k in 1usize..4,
        n in 1usize..4,
        seed in 0u32..1000,
    ) {
        let fill = |len: usize, off: u32| -> Vec<f32> {
            (0..len)
                .map(|i| (((i as u32 * 31 + seed + off) % 17) as f32 - 8.0) / 8.0)
                .collect()
        };
        let a = fill(m * k, 0);
        let b = fill(k * n, 5);
        let w = fill(m * n, 11);
        let (an, nu) = gradients(
            |t| weighted_sum(&matmul(t, &Tensor::from_vec(b.clone(), false), m, k, n), &w),
            &a,
        );
        assert_close(&an, &nu, 0.05);
    }

    #[test]
    fn prop_add_bias_grad_sums_rows(rows in 1usize..6, cols in 1usize..6) {
        let x = Tensor::zeros(rows * cols, false);
        let bias = Tensor::zeros(cols, true);
        sum(&add_bias(&x, &bias, rows, cols)).backward();
        prop_assert!(bias.grad().unwrap().iter().all(|&g| g == rows as f32));
    }
}
