//! Classification metrics: Accuracy, Precision, Recall, F1
//!
//! Predictions are probabilities. One value per target is a binary problem
//! (thresholded); `k` values per target is a `k`-class problem (argmax), in
//! which case precision, recall and F1 are macro averages over the classes.

use crate::Tensor;

use super::Metric;

/// Discrete labels and class count derived from predictions and targets
fn to_labels(
    predictions: &Tensor,
    targets: &Tensor,
    threshold: f32,
) -> (Vec<usize>, Vec<usize>, usize) {
    let n = targets.len();
    assert!(
        n > 0 && predictions.len() % n == 0,
        "Predictions must hold one value or one row of probabilities per target"
    );
    let classes = predictions.len() / n;
    let preds = predictions.data();
    let y_true: Vec<usize> = if classes == 1 {
        targets.data().iter().map(|&t| usize::from(t >= 0.5)).collect()
    } else {
        targets.data().iter().map(|&t| t as usize).collect()
    };
    let y_pred: Vec<usize> = if classes == 1 {
        preds.iter().map(|&p| usize::from(p >= threshold)).collect()
    } else {
        preds
            .as_slice()
            .expect("contiguous")
            .chunks(classes)
            .map(argmax)
            .collect()
    };
    (y_pred, y_true, classes.max(2))
}

fn argmax(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, &p) in row.iter().enumerate() {
        if p > row[best] {
            best = i;
        }
    }
    best
}

/// True positives, predicted positives and actual positives of one class
fn class_counts(y_pred: &[usize], y_true: &[usize], class: usize) -> (usize, usize, usize) {
    y_pred.iter().zip(y_true).fold((0, 0, 0), |(tp, pp, ap), (&p, &t)| {
        (
            tp + usize::from(p == class && t == class),
            pp + usize::from(p == class),
            ap + usize::from(t == class),
        )
    })
}

fn ratio(num: usize, den: usize) -> f32 {
    if den == 0 {
        0.0
    } else {
        num as f32 / den as f32
    }
}

fn harmonic(precision: f32, recall: f32) -> f32 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Per-class scores: positive class only for binary, every class otherwise
fn scores<F>(predictions: &Tensor, targets: &Tensor, threshold: f32, score: F) -> f32
where
    F: Fn(usize, usize, usize) -> f32,
{
    if targets.is_empty() {
        return 0.0;
    }
    let (y_pred, y_true, classes) = to_labels(predictions, targets, threshold);
    if predictions.len() == targets.len() {
        let (tp, pp, ap) = class_counts(&y_pred, &y_true, 1);
        return score(tp, pp, ap);
    }
    let total: f32 = (0..classes)
        .map(|c| {
            let (tp, pp, ap) = class_counts(&y_pred, &y_true, c);
            score(tp, pp, ap)
        })
        .sum();
    total / classes as f32
}

/// Accuracy metric for classification
///
/// For binary classification: fraction of correct thresholded predictions.
/// For multi-class: fraction where argmax(pred) == target.
///
/// # Example
///
/// ```
/// use widedeep::train::{Accuracy, Metric};
/// use widedeep::Tensor;
///
/// let metric = Accuracy::new(0.5);
/// let pred = Tensor::from_vec(vec![0.9, 0.2, 0.8], false);
/// let target = Tensor::from_vec(vec![1.0, 0.0, 1.0], false);
///
/// assert_eq!(metric.compute(&pred, &target), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Accuracy {
    pub(crate) threshold: f32,
}

impl Accuracy {
    /// Create new accuracy metric with given threshold for binary classification
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl Default for Accuracy {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Metric for Accuracy {
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32 {
        if targets.is_empty() {
            return 0.0;
        }
        let (y_pred, y_true, _) = to_labels(predictions, targets, self.threshold);
        let correct = y_pred.iter().zip(&y_true).filter(|(p, t)| p == t).count();
        ratio(correct, y_true.len())
    }

    fn name(&self) -> &'static str {
        "acc"
    }
}

/// Precision metric (true positives / predicted positives)
///
/// # Example
///
/// ```
/// use widedeep::train::{Precision, Metric};
/// use widedeep::Tensor;
///
/// let metric = Precision::new(0.5);
/// let pred = Tensor::from_vec(vec![0.9, 0.8, 0.2], false);
/// let target = Tensor::from_vec(vec![1.0, 0.0, 0.0], false);
///
/// assert_eq!(metric.compute(&pred, &target), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct Precision {
    pub(crate) threshold: f32,
}

impl Precision {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Metric for Precision {
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32 {
        scores(predictions, targets, self.threshold, |tp, pp, _| ratio(tp, pp))
    }

    fn name(&self) -> &'static str {
        "prec"
    }
}

/// Recall metric (true positives / actual positives)
#[derive(Debug, Clone)]
pub struct Recall {
    pub(crate) threshold: f32,
}

impl Recall {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl Default for Recall {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Metric for Recall {
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32 {
        scores(predictions, targets, self.threshold, |tp, _, ap| ratio(tp, ap))
    }

    fn name(&self) -> &'static str {
        "rec"
    }
}

/// F1 Score (harmonic mean of precision and recall)
///
/// F1 = 2 * (precision * recall) / (precision + recall)
#[derive(Debug, Clone)]
pub struct F1Score {
    pub(crate) threshold: f32,
}

impl F1Score {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl Default for F1Score {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Metric for F1Score {
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32 {
        scores(predictions, targets, self.threshold, |tp, pp, ap| {
            harmonic(ratio(tp, pp), ratio(tp, ap))
        })
    }

    fn name(&self) -> &'static str {
        "f1"
    }
}
