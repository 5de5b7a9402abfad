//! Build training components from configuration

use super::schema::{CallbacksSpec, OptimSpec, SchedulerSpec};
use crate::error::{Error, Result};
use crate::optim::{
    Adam, AdamW, AnnealStrategy, CyclicLR, CyclicMode, ExponentialLR, LRScheduler, MultiStepLR,
    OneCycleLR, Optimizer, PlateauMode, RAdam, RMSprop, ReduceLROnPlateau, StepLR, ThresholdMode,
    SGD,
};
use crate::train::{
    Accuracy, EarlyStopping, F1Score, LRHistory, Metric, ModelCheckpoint, Precision, R2Score,
    Recall, TrainerCallback,
};
use serde_json::Value;
use std::collections::HashMap;

// Optimizer parameter names
const PARAM_MOMENTUM: &str = "momentum";
const PARAM_BETA1: &str = "beta1";
const PARAM_BETA2: &str = "beta2";
const PARAM_EPS: &str = "eps";
const PARAM_ALPHA: &str = "alpha";
const PARAM_WEIGHT_DECAY: &str = "weight_decay";
const PARAM_NESTEROV: &str = "nesterov";

// Scheduler parameter names
const PARAM_STEP_SIZE: &str = "step_size";
const PARAM_GAMMA: &str = "gamma";
const PARAM_MILESTONES: &str = "milestones";
const PARAM_BASE_LR: &str = "base_lr";
const PARAM_MAX_LR: &str = "max_lr";
const PARAM_STEP_SIZE_UP: &str = "step_size_up";
const PARAM_STEP_SIZE_DOWN: &str = "step_size_down";
const PARAM_MODE: &str = "mode";
const PARAM_FACTOR: &str = "factor";
const PARAM_PATIENCE: &str = "patience";
const PARAM_THRESHOLD: &str = "threshold";
const PARAM_COOLDOWN: &str = "cooldown";
const PARAM_MIN_LR: &str = "min_lr";
const PARAM_PCT_START: &str = "pct_start";
const PARAM_ANNEAL: &str = "anneal_strategy";

/// Optimizer names accepted by [`build_optimizer`]
pub const OPTIMIZERS: [&str; 5] = ["sgd", "adam", "adamw", "radam", "rmsprop"];

/// Scheduler names accepted by [`build_scheduler`]
pub const SCHEDULERS: [&str; 6] = ["step", "multistep", "exponential", "plateau", "cyclic", "onecycle"];

fn float(params: &HashMap<String, Value>, key: &str, default: f32) -> f32 {
    params.get(key).and_then(Value::as_f64).map_or(default, |v| v as f32)
}

fn count(params: &HashMap<String, Value>, key: &str) -> Option<usize> {
    params.get(key).and_then(Value::as_u64).map(|v| v as usize)
}

fn required_count(params: &HashMap<String, Value>, key: &str, scheduler: &str) -> Result<usize> {
    count(params, key).ok_or_else(|| {
        Error::InvalidConfig(format!("scheduler '{scheduler}' needs a positive integer '{key}'"))
    })
}

fn text<'a>(params: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

/// Build optimizer from configuration
pub fn build_optimizer(spec: &OptimSpec) -> Result<Box<dyn Optimizer>> {
    let params = &spec.params;
    let weight_decay = float(params, PARAM_WEIGHT_DECAY, 0.0);
    match spec.name.to_lowercase().as_str() {
        "sgd" => {
            let nesterov = params.get(PARAM_NESTEROV).and_then(Value::as_bool).unwrap_or(false);
            Ok(Box::new(
                SGD::new(spec.lr, float(params, PARAM_MOMENTUM, 0.0))
                    .with_weight_decay(weight_decay)
                    .with_nesterov(nesterov),
            ))
        }
        "adam" => Ok(Box::new(
            Adam::new(
                spec.lr,
                float(params, PARAM_BETA1, 0.9),
                float(params, PARAM_BETA2, 0.999),
                float(params, PARAM_EPS, 1e-8),
            )
            .with_weight_decay(weight_decay),
        )),
        "adamw" => Ok(Box::new(AdamW::new(
            spec.lr,
            float(params, PARAM_BETA1, 0.9),
            float(params, PARAM_BETA2, 0.999),
            float(params, PARAM_EPS, 1e-8),
            float(params, PARAM_WEIGHT_DECAY, 0.01),
        ))),
        "radam" => Ok(Box::new(
            RAdam::new(
                spec.lr,
                float(params, PARAM_BETA1, 0.9),
                float(params, PARAM_BETA2, 0.999),
                float(params, PARAM_EPS, 1e-8),
            )
            .with_weight_decay(weight_decay),
        )),
        "rmsprop" => Ok(Box::new(
            RMSprop::new(spec.lr, float(params, PARAM_ALPHA, 0.99), float(params, PARAM_EPS, 1e-8))
                .with_momentum(float(params, PARAM_MOMENTUM, 0.0))
                .with_weight_decay(weight_decay),
        )),
        name => Err(Error::InvalidConfig(format!(
            "Unknown optimizer: {name}. Supported: {}",
            OPTIMIZERS.join(", ")
        ))),
    }
}

/// Build a learning rate scheduler for an optimizer starting at `lr`
///
/// `total_steps` (batches over the whole run) sizes `onecycle`.
pub fn build_scheduler(
    spec: &SchedulerSpec,
    lr: f32,
    total_steps: usize,
) -> Result<Box<dyn LRScheduler>> {
    let params = &spec.params;
    let name = spec.name.to_lowercase();
    match name.as_str() {
        "step" => {
            let step_size = required_count(params, PARAM_STEP_SIZE, &name)?;
            Ok(Box::new(StepLR::new(lr, step_size, float(params, PARAM_GAMMA, 0.1))))
        }
        "multistep" => {
            let milestones: Vec<usize> = params
                .get(PARAM_MILESTONES)
                .and_then(Value::as_array)
                .map(|values| values.iter().filter_map(Value::as_u64).map(|v| v as usize).collect())
                .unwrap_or_default();
            if milestones.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "scheduler '{name}' needs a non-empty '{PARAM_MILESTONES}' list"
                )));
            }
            Ok(Box::new(MultiStepLR::new(lr, milestones, float(params, PARAM_GAMMA, 0.1))))
        }
        "exponential" => Ok(Box::new(ExponentialLR::new(lr, float(params, PARAM_GAMMA, 0.9)))),
        "plateau" => {
            let mode = match text(params, PARAM_MODE).unwrap_or("min") {
                "min" => PlateauMode::Min,
                "max" => PlateauMode::Max,
                other => {
                    return Err(Error::InvalidConfig(format!(
                        "plateau mode must be 'min' or 'max', got '{other}'"
                    )))
                }
            };
            Ok(Box::new(
                ReduceLROnPlateau::new(lr)
                    .with_mode(mode)
                    .with_factor(float(params, PARAM_FACTOR, 0.1))
                    .with_patience(count(params, PARAM_PATIENCE).unwrap_or(10))
                    .with_threshold(float(params, PARAM_THRESHOLD, 1e-4), ThresholdMode::Rel)
                    .with_cooldown(count(params, PARAM_COOLDOWN).unwrap_or(0))
                    .with_min_lr(float(params, PARAM_MIN_LR, 0.0)),
            ))
        }
        "cyclic" => {
            let step_size_up = required_count(params, PARAM_STEP_SIZE_UP, &name)?;
            let mode = match text(params, PARAM_MODE).unwrap_or("triangular") {
                "triangular" => CyclicMode::Triangular,
                "triangular2" => CyclicMode::Triangular2,
                "exp_range" => CyclicMode::ExpRange { gamma: float(params, PARAM_GAMMA, 1.0) },
                other => {
                    return Err(Error::InvalidConfig(format!("unknown cyclic mode '{other}'")))
                }
            };
            let mut scheduler = CyclicLR::new(
                float(params, PARAM_BASE_LR, lr),
                float(params, PARAM_MAX_LR, lr * 10.0),
                step_size_up,
            )
            .with_mode(mode);
            if let Some(down) = count(params, PARAM_STEP_SIZE_DOWN) {
                scheduler = scheduler.with_step_size_down(down);
            }
            Ok(Box::new(scheduler))
        }
        "onecycle" => {
            if total_steps == 0 {
                return Err(Error::InvalidConfig("onecycle needs at least one step".into()));
            }
            let anneal = match text(params, PARAM_ANNEAL).unwrap_or("cos") {
                "cos" => AnnealStrategy::Cos,
                "linear" => AnnealStrategy::Linear,
                other => {
                    return Err(Error::InvalidConfig(format!("unknown anneal strategy '{other}'")))
                }
            };
            Ok(Box::new(
                OneCycleLR::new(float(params, PARAM_MAX_LR, lr), total_steps)
                    .with_pct_start(float(params, PARAM_PCT_START, 0.3))
                    .with_anneal_strategy(anneal),
            ))
        }
        other => Err(Error::InvalidConfig(format!(
            "Unknown scheduler: {other}. Supported: {}",
            SCHEDULERS.join(", ")
        ))),
    }
}

/// Build a metric from its short name
pub fn build_metric(name: &str) -> Result<Box<dyn Metric>> {
    match name.to_lowercase().as_str() {
        "acc" | "accuracy" => Ok(Box::new(Accuracy::default())),
        "prec" | "precision" => Ok(Box::new(Precision::default())),
        "rec" | "recall" => Ok(Box::new(Recall::default())),
        "f1" => Ok(Box::new(F1Score::default())),
        "r2" => Ok(Box::new(R2Score)),
        other => Err(Error::InvalidConfig(format!(
            "Unknown metric: {other}. Supported: acc, prec, rec, f1, r2"
        ))),
    }
}

/// Build the optional callbacks, in the order early stopping, checkpoint, lr history
pub fn build_callbacks(spec: &CallbacksSpec) -> Vec<Box<dyn TrainerCallback>> {
    let mut callbacks: Vec<Box<dyn TrainerCallback>> = Vec::new();
    if let Some(es) = &spec.early_stopping {
        let mut callback = EarlyStopping::new(es.monitor.clone())
            .with_min_delta(es.min_delta)
            .with_patience(es.patience)
            .with_mode(es.mode)
            .with_restore_best_weights(es.restore_best_weights);
        if let Some(baseline) = es.baseline {
            callback = callback.with_baseline(baseline);
        }
        callbacks.push(Box::new(callback));
    }
    if let Some(ckpt) = &spec.checkpoint {
        callbacks.push(Box::new(
            ModelCheckpoint::new(ckpt.filepath.clone())
                .with_monitor(ckpt.monitor.clone())
                .with_save_best_only(ckpt.save_best_only)
                .with_mode(ckpt.mode)
                .with_period(ckpt.period)
                .with_max_save(ckpt.max_save),
        ));
    }
    if spec.lr_history {
        callbacks.push(Box::new(LRHistory::new()));
    }
    callbacks
}
