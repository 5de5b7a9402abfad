//! Tests for learning rate schedulers

use super::*;
use crate::optim::{Optimizer, SGD};
use approx::assert_abs_diff_eq;

fn trace(scheduler: &mut dyn LRScheduler, steps: usize) -> Vec<f32> {
    let mut lrs = vec![scheduler.get_lr()];
    for _ in 0..steps {
        scheduler.step();
        lrs.push(scheduler.get_lr());
    }
    lrs
}

#[test]
fn test_step_lr_decays_every_step_size() {
    let mut scheduler = StepLR::new(1.0, 2, 0.5);
    let lrs = trace(&mut scheduler, 5);
    let expected = [1.0, 1.0, 0.5, 0.5, 0.25, 0.25];
    for (lr, want) in lrs.iter().zip(expected) {
        assert_abs_diff_eq!(*lr, want, epsilon = 1e-6);
    }
    assert_eq!(scheduler.step_mode(), StepMode::PerEpoch);
}

#[test]
fn test_step_lr_zero_step_size_is_constant() {
    let mut scheduler = StepLR::new(0.3, 0, 0.1);
    assert!(trace(&mut scheduler, 4).iter().all(|&lr| lr == 0.3));
}

#[test]
fn test_multi_step_lr_milestones() {
    let mut scheduler = MultiStepLR::new(1.0, vec![3, 1], 0.1);
    let lrs = trace(&mut scheduler, 4);
    assert_abs_diff_eq!(lrs[0], 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(lrs[1], 0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(lrs[2], 0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(lrs[3], 0.01, epsilon = 1e-7);
    assert_abs_diff_eq!(lrs[4], 0.01, epsilon = 1e-7);
}

#[test]
fn test_exponential_lr() {
    let mut scheduler = ExponentialLR::new(2.0, 0.5);
    let lrs = trace(&mut scheduler, 3);
    assert_eq!(lrs, vec![2.0, 1.0, 0.5, 0.25]);
}

#[test]
fn test_plateau_reduces_after_patience() {
    let mut scheduler = ReduceLROnPlateau::new(1.0).with_patience(2);
    scheduler.step_with_metric(1.0);
    scheduler.step_with_metric(1.0);
    scheduler.step_with_metric(1.0);
    assert_abs_diff_eq!(scheduler.get_lr(), 1.0, epsilon = 1e-6);
    scheduler.step_with_metric(1.0);
    assert_abs_diff_eq!(scheduler.get_lr(), 0.1, epsilon = 1e-6);
    assert_eq!(scheduler.num_bad_epochs(), 0);
}

#[test]
fn test_plateau_improvement_resets_counter() {
    let mut scheduler = ReduceLROnPlateau::new(1.0).with_patience(1);
    for metric in [5.0, 4.0, 3.0, 2.0, 1.0] {
        scheduler.step_with_metric(metric);
    }
    assert_abs_diff_eq!(scheduler.get_lr(), 1.0, epsilon = 1e-6);
}

#[test]
fn test_plateau_max_mode_and_min_lr() {
    let mut scheduler = ReduceLROnPlateau::new(1.0)
        .with_mode(PlateauMode::Max)
        .with_patience(0)
        .with_factor(0.5)
        .with_min_lr(0.3);
    scheduler.step_with_metric(0.9);
    scheduler.step_with_metric(0.8);
    assert_abs_diff_eq!(scheduler.get_lr(), 0.5, epsilon = 1e-6);
    scheduler.step_with_metric(0.8);
    assert_abs_diff_eq!(scheduler.get_lr(), 0.3, epsilon = 1e-6);
    scheduler.step_with_metric(0.8);
    assert_abs_diff_eq!(scheduler.get_lr(), 0.3, epsilon = 1e-6);
}

#[test]
fn test_plateau_cooldown_delays_next_reduction() {
    let mut scheduler = ReduceLROnPlateau::new(1.0).with_patience(0).with_cooldown(2);
    scheduler.step_with_metric(1.0);
    scheduler.step_with_metric(1.0);
    assert_abs_diff_eq!(scheduler.get_lr(), 0.1, epsilon = 1e-6);
    scheduler.step_with_metric(1.0);
    scheduler.step_with_metric(1.0);
    assert_abs_diff_eq!(scheduler.get_lr(), 0.1, epsilon = 1e-6);
    scheduler.step_with_metric(1.0);
    assert_abs_diff_eq!(scheduler.get_lr(), 0.01, epsilon = 1e-7);
}

#[test]
fn test_plateau_plain_step_is_noop() {
    let mut scheduler = ReduceLROnPlateau::new(0.5).with_patience(0);
    for _ in 0..5 {
        scheduler.step();
    }
    assert_eq!(scheduler.get_lr(), 0.5);
    assert!(scheduler.needs_metric());
}

#[test]
fn test_cyclic_triangular_shape() {
    let mut scheduler = CyclicLR::new(0.1, 0.5, 2);
    let lrs = trace(&mut scheduler, 8);
    let expected = [0.1, 0.3, 0.5, 0.3, 0.1, 0.3, 0.5, 0.3, 0.1];
    for (lr, want) in lrs.iter().zip(expected) {
        assert_abs_diff_eq!(*lr, want, epsilon = 1e-5);
    }
    assert_eq!(scheduler.step_mode(), StepMode::PerBatch);
}

#[test]
fn test_cyclic_triangular2_halves_amplitude() {
    let mut scheduler = CyclicLR::new(0.0, 1.0, 2).with_mode(CyclicMode::Triangular2);
    let lrs = trace(&mut scheduler, 6);
    assert_abs_diff_eq!(lrs[2], 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(lrs[6], 0.5, epsilon = 1e-5);
}

#[test]
fn test_cyclic_exp_range_decays_peaks() {
    let mut scheduler = CyclicLR::new(0.0, 1.0, 2).with_mode(CyclicMode::ExpRange { gamma: 0.9 });
    let lrs = trace(&mut scheduler, 6);
    assert_abs_diff_eq!(lrs[2], 0.81, epsilon = 1e-5);
    assert!(lrs[6] < lrs[2]);
}

#[test]
fn test_one_cycle_warmup_peak_and_floor() {
    let mut scheduler = OneCycleLR::new(1.0, 100);
    let lrs = trace(&mut scheduler, 120);
    assert_abs_diff_eq!(lrs[0], 1.0 / 25.0, epsilon = 1e-6);
    let peak = lrs.iter().cloned().fold(f32::MIN, f32::max);
    assert_abs_diff_eq!(peak, 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(lrs[29], 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(lrs[99], 1.0 / 25.0 / 1e4, epsilon = 1e-6);
    assert_eq!(lrs[119], lrs[99]);
}

#[test]
fn test_one_cycle_linear_is_monotone_per_phase() {
    let mut scheduler = OneCycleLR::from_epochs(0.5, 5, 4)
        .with_anneal_strategy(AnnealStrategy::Linear)
        .with_pct_start(0.5);
    let lrs = trace(&mut scheduler, 19);
    assert!(lrs[..10].windows(2).all(|w| w[1] >= w[0]));
    assert!(lrs[9..].windows(2).all(|w| w[1] <= w[0]));
}

#[test]
fn test_apply_sets_optimizer_lr() {
    let scheduler = ExponentialLR::new(0.25, 0.9);
    let mut opt = SGD::new(1.0, 0.0);
    scheduler.apply(&mut opt);
    assert_eq!(opt.lr(), 0.25);
}
