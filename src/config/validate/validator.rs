//! Configuration validation logic

use super::error::ValidationError;
use crate::config::builder::{OPTIMIZERS, SCHEDULERS};
use crate::config::schema::{ExperimentSpec, ObjectiveKind};
use crate::train::MODEL_GROUP;

const METRICS: [&str; 8] = ["acc", "accuracy", "prec", "precision", "rec", "recall", "f1", "r2"];

/// Components the data section gives inputs for, in model order
pub fn configured_components(spec: &ExperimentSpec) -> Vec<&'static str> {
    let data = &spec.data;
    let mut components = Vec::new();
    if !data.wide_cols.is_empty() || !data.crossed_cols.is_empty() {
        components.push("wide");
    }
    if !data.embed_cols.is_empty() || !data.continuous_cols.is_empty() {
        components.push("deepdense");
    }
    if data.text_col.is_some() {
        components.push("deeptext");
    }
    let has_deep = components.iter().any(|c| *c != "wide");
    if has_deep && !spec.model.deephead.is_empty() {
        components.push("deephead");
    }
    components
}

/// Validate an experiment specification
///
/// Checks:
/// - The data file exists and at least one input column is configured
/// - Numeric values are in valid ranges
/// - Optimizer, scheduler and metric names are known
/// - Every optimizer and scheduler names an existing parameter group
pub fn validate_config(spec: &ExperimentSpec) -> Result<(), ValidationError> {
    // Skip in unit tests where files may not exist
    #[cfg(not(test))]
    if !spec.data.csv.exists() {
        return Err(ValidationError::CsvNotFound(spec.data.csv.display().to_string()));
    }

    validate_data(spec)?;
    validate_model(spec)?;
    validate_training(spec)?;
    validate_groups(spec)?;
    validate_callbacks(spec)
}

fn validate_data(spec: &ExperimentSpec) -> Result<(), ValidationError> {
    let data = &spec.data;
    if data.target.trim().is_empty() {
        return Err(ValidationError::EmptyTarget);
    }
    if configured_components(spec).is_empty() {
        return Err(ValidationError::NoInputColumns);
    }

    let inputs = data
        .wide_cols
        .iter()
        .chain(data.crossed_cols.iter().flat_map(|(a, b)| [a, b]))
        .chain(data.continuous_cols.iter())
        .chain(data.text_col.iter())
        .map(String::as_str)
        .chain(data.embed_cols.iter().map(|c| c.name()));
    for name in inputs {
        if name == data.target {
            return Err(ValidationError::TargetAsInput(name.to_string()));
        }
    }

    if let Some(col) = data.embed_cols.iter().find(|c| c.dim() == 0) {
        return Err(ValidationError::ZeroEmbedDim(col.name().to_string()));
    }
    if data.text_col.is_some() && (data.text.maxlen == 0 || data.text.max_vocab == 0) {
        return Err(ValidationError::InvalidTextSettings);
    }
    Ok(())
}

fn validate_model(spec: &ExperimentSpec) -> Result<(), ValidationError> {
    let model = &spec.model;
    let dropouts = model.dropout.iter().chain(&model.deephead_dropout).chain([&model.embed_dropout]);
    for &p in dropouts {
        if !(0.0..1.0).contains(&p) {
            return Err(ValidationError::InvalidDropout(p));
        }
    }
    if model.hidden_layers.contains(&0) {
        return Err(ValidationError::ZeroWidthLayer("hidden_layers"));
    }
    if model.deephead.contains(&0) {
        return Err(ValidationError::ZeroWidthLayer("deephead"));
    }
    if spec.data.text_col.is_some()
        && (model.rnn_hidden_dim == 0 || model.rnn_layers == 0 || model.word_embed_dim == 0)
    {
        return Err(ValidationError::ZeroWidthLayer("deeptext"));
    }
    Ok(())
}

fn validate_training(spec: &ExperimentSpec) -> Result<(), ValidationError> {
    let training = &spec.training;
    if training.batch_size == 0 {
        return Err(ValidationError::InvalidBatchSize(training.batch_size));
    }
    if training.epochs == 0 {
        return Err(ValidationError::InvalidEpochs(training.epochs));
    }
    if !(0.0..1.0).contains(&training.val_split) {
        return Err(ValidationError::InvalidValSplit(training.val_split));
    }
    if training.validation_freq == 0 {
        return Err(ValidationError::InvalidValidationFreq(training.validation_freq));
    }
    if training.objective == ObjectiveKind::Multiclass
        && !matches!(training.n_classes, Some(n) if n >= 2)
    {
        return Err(ValidationError::InvalidClasses(training.n_classes));
    }
    if let Some(grad_clip) = training.grad_clip {
        if grad_clip <= 0.0 {
            return Err(ValidationError::InvalidGradClip(grad_clip));
        }
    }
    if let Some(metric) = training
        .metrics
        .iter()
        .find(|m| !METRICS.contains(&m.to_lowercase().as_str()))
    {
        return Err(ValidationError::InvalidMetric(metric.clone()));
    }
    Ok(())
}

fn validate_groups(spec: &ExperimentSpec) -> Result<(), ValidationError> {
    let components = configured_components(spec);
    let single = spec.optimizers.contains_key(MODEL_GROUP);
    if single && spec.optimizers.len() > 1 {
        return Err(ValidationError::MixedGroups);
    }

    for (group, optim) in &spec.optimizers {
        if group != MODEL_GROUP && !components.contains(&group.as_str()) {
            return Err(ValidationError::UnknownGroup(group.clone()));
        }
        if !OPTIMIZERS.contains(&optim.name.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidOptimizer(optim.name.clone()));
        }
        if optim.lr <= 0.0 || optim.lr > 1.0 {
            return Err(ValidationError::InvalidLearningRate { group: group.clone(), lr: optim.lr });
        }
    }

    for (group, scheduler) in &spec.schedulers {
        let known = if single { group == MODEL_GROUP } else { components.contains(&group.as_str()) };
        if !known {
            return Err(if group == MODEL_GROUP || single {
                ValidationError::SchedulerWithoutOptimizer(group.clone())
            } else {
                ValidationError::UnknownGroup(group.clone())
            });
        }
        if !SCHEDULERS.contains(&scheduler.name.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidLRScheduler(scheduler.name.clone()));
        }
    }
    Ok(())
}

fn validate_callbacks(spec: &ExperimentSpec) -> Result<(), ValidationError> {
    if let Some(ckpt) = &spec.callbacks.checkpoint {
        if ckpt.period == 0 {
            return Err(ValidationError::InvalidCheckpointPeriod(ckpt.period));
        }
    }
    Ok(())
}
