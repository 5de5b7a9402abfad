//! Tests for evaluation metrics

use crate::Tensor;

use super::{Accuracy, F1Score, Metric, Precision, R2Score, Recall};

fn t(values: &[f32]) -> Tensor {
    Tensor::from_vec(values.to_vec(), false)
}

#[test]
fn test_accuracy_perfect() {
    let acc = Accuracy::default().compute(&t(&[0.9, 0.1, 0.8, 0.2]), &t(&[1.0, 0.0, 1.0, 0.0]));
    assert!((acc - 1.0).abs() < 1e-5);
}

#[test]
fn test_accuracy_half() {
    let acc = Accuracy::default().compute(&t(&[0.9, 0.9, 0.1, 0.1]), &t(&[1.0, 0.0, 1.0, 0.0]));
    assert!((acc - 0.5).abs() < 1e-5);
}

#[test]
fn test_accuracy_multiclass_argmax() {
    // rows: argmax 2, 0, 1
    let probs = t(&[0.1, 0.2, 0.7, 0.5, 0.3, 0.2, 0.2, 0.6, 0.2]);
    let acc = Accuracy::default().compute(&probs, &t(&[2.0, 1.0, 1.0]));
    assert!((acc - 2.0 / 3.0).abs() < 1e-5);
}

#[test]
fn test_precision_and_recall() {
    let pred = t(&[0.9, 0.8, 0.2, 0.1]);
    let target = t(&[1.0, 0.0, 1.0, 0.0]);
    assert!((Precision::default().compute(&pred, &target) - 0.5).abs() < 1e-5);
    assert!((Recall::default().compute(&pred, &target) - 0.5).abs() < 1e-5);
    assert!((F1Score::default().compute(&pred, &target) - 0.5).abs() < 1e-5);
}

#[test]
fn test_precision_no_predicted_positives() {
    let prec = Precision::default().compute(&t(&[0.1, 0.2]), &t(&[1.0, 0.0]));
    assert_eq!(prec, 0.0);
}

#[test]
fn test_macro_recall_multiclass() {
    // predicted: 0, 0, 1 ; true: 0, 1, 1
    let probs = t(&[0.9, 0.1, 0.8, 0.2, 0.3, 0.7]);
    let rec = Recall::default().compute(&probs, &t(&[0.0, 1.0, 1.0]));
    // class 0: 1/1, class 1: 1/2
    assert!((rec - 0.75).abs() < 1e-5);
}

#[test]
fn test_r2_perfect_and_mean() {
    let target = t(&[1.0, 2.0, 3.0]);
    assert!((R2Score.compute(&t(&[1.0, 2.0, 3.0]), &target) - 1.0).abs() < 1e-6);
    assert!(R2Score.compute(&t(&[2.0, 2.0, 2.0]), &target).abs() < 1e-6);
}

#[test]
fn test_r2_constant_targets() {
    let target = t(&[4.0, 4.0]);
    assert_eq!(R2Score.compute(&t(&[4.0, 4.0]), &target), 1.0);
    assert_eq!(R2Score.compute(&t(&[3.0, 4.0]), &target), 0.0);
}

#[test]
fn test_metric_names() {
    assert_eq!(Accuracy::default().name(), "acc");
    assert_eq!(Precision::default().name(), "prec");
    assert_eq!(Recall::default().name(), "rec");
    assert_eq!(F1Score::default().name(), "f1");
    assert_eq!(R2Score.name(), "r2");
}
