//! Training from YAML configuration

use super::builder::{build_callbacks, build_metric, build_optimizer, build_scheduler};
use super::schema::{ExperimentSpec, ObjectiveKind};
use super::validate::validate_config;
use crate::data::{Frame, ModelInput, WideDeepDataset};
use crate::error::{Error, Result};
use crate::models::{DeepDense, DeepText, Wide, WideDeep};
use crate::preprocessing::{DensePreprocessor, LabelEncoder, TextPreprocessor, WidePreprocessor};
use crate::train::{Objective, TrainResult, Trainer, DEFAULT_LR, MODEL_GROUP};
use ndarray::Array1;
use std::fs;
use std::path::Path;
use tracing::info;

/// Load and validate a YAML experiment file
///
/// A relative `data.csv` is resolved against the directory of the config file.
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<ExperimentSpec> {
    let config_path = config_path.as_ref();
    let yaml_content = fs::read_to_string(config_path).map_err(|e| {
        Error::InvalidConfig(format!(
            "Failed to read config file {}: {e}",
            config_path.display()
        ))
    })?;

    let mut spec: ExperimentSpec = serde_yaml::from_str(&yaml_content)
        .map_err(|e| Error::InvalidConfig(format!("Failed to parse YAML config: {e}")))?;

    if spec.data.csv.is_relative() {
        if let Some(dir) = config_path.parent() {
            spec.data.csv = dir.join(&spec.data.csv);
        }
    }

    validate_config(&spec).map_err(|e| Error::InvalidConfig(format!("Invalid config: {e}")))?;

    Ok(spec)
}

/// Fitted preprocessors and the dataset they produced
pub struct PreparedData {
    pub dataset: WideDeepDataset,
    pub wide: Option<WidePreprocessor>,
    pub dense: Option<DensePreprocessor>,
    pub text: Option<TextPreprocessor>,
}

/// Read the CSV and run every configured preprocessor over it
pub fn prepare_data(spec: &ExperimentSpec) -> Result<PreparedData> {
    let frame = Frame::from_csv_path(&spec.data.csv)?;
    prepare_frame(spec, &frame)
}

/// Run every configured preprocessor over `frame`
pub fn prepare_frame(spec: &ExperimentSpec, frame: &Frame) -> Result<PreparedData> {
    let data = &spec.data;
    let mut input = ModelInput::new();

    let wide = if data.wide_cols.is_empty() && data.crossed_cols.is_empty() {
        None
    } else {
        let mut prep = WidePreprocessor::new(data.wide_cols.clone(), data.crossed_cols.clone());
        input = input.with_wide(prep.fit_transform(frame)?);
        Some(prep)
    };

    let dense = if data.embed_cols.is_empty() && data.continuous_cols.is_empty() {
        None
    } else {
        let embed_cols = data.embed_cols.iter().map(|c| (c.name().to_string(), c.dim())).collect();
        let mut prep =
            DensePreprocessor::new(embed_cols, data.continuous_cols.clone()).with_scale(data.scale);
        input = input.with_deep(prep.fit_transform(frame)?);
        Some(prep)
    };

    let text = match &data.text_col {
        Some(column) => {
            let texts = frame.require(column)?.to_strings();
            let mut prep =
                TextPreprocessor::new(data.text.maxlen, data.text.max_vocab, data.text.min_freq);
            input = input.with_text(prep.fit_transform(&texts)?);
            Some(prep)
        }
        None => None,
    };

    let target = encode_target(frame, &data.target, spec.training.objective)?;
    let dataset = WideDeepDataset::new(input, target)?;
    info!(
        rows = dataset.len(),
        wide = wide.is_some(),
        deepdense = dense.is_some(),
        deeptext = text.is_some(),
        "data prepared"
    );
    Ok(PreparedData { dataset, wide, dense, text })
}

/// Numeric targets as they are; text labels of classification problems become `0..n`
fn encode_target(frame: &Frame, name: &str, objective: ObjectiveKind) -> Result<Array1<f32>> {
    let column = frame.require(name)?;
    match column.to_numbers(name) {
        Ok(values) => Ok(values.into_iter().map(|v| v as f32).collect()),
        Err(_) if objective != ObjectiveKind::Regression => {
            let mut encoder = LabelEncoder::new(Some(vec![name.to_string()]));
            encoder.fit(frame)?;
            Ok(column
                .to_strings()
                .iter()
                .map(|v| encoder.code(name, v).saturating_sub(1) as f32)
                .collect())
        }
        Err(e) => Err(e),
    }
}

/// Build the wide & deep model for the prepared inputs
pub fn build_model(spec: &ExperimentSpec, prepared: &PreparedData) -> Result<WideDeep> {
    let objective = objective(spec)?;
    let pred_dim = objective.pred_dim();
    let model_spec = &spec.model;
    let seed = model_spec.seed;
    let offset = |n: u64| seed.map(|s| s.wrapping_add(n));

    let mut builder = WideDeep::builder().pred_dim(pred_dim);
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }

    if let Some(wide) = &prepared.wide {
        let wide_dim = wide.wide_dim()?;
        let component = match offset(1) {
            Some(s) => Wide::with_seed(wide_dim, pred_dim, s),
            None => Wide::new(wide_dim, pred_dim),
        };
        builder = builder.wide(component);
    }

    if let Some(dense) = &prepared.dense {
        let mut deep = DeepDense::builder()
            .column_idx(dense.column_idx())
            .embed_input(dense.embed_input()?)
            .continuous_cols(dense.continuous_cols().to_vec())
            .hidden_layers(model_spec.hidden_layers.clone())
            .dropout(model_spec.dropout.clone())
            .batchnorm(model_spec.batchnorm)
            .embed_dropout(model_spec.embed_dropout);
        if let Some(s) = offset(2) {
            deep = deep.seed(s);
        }
        builder = builder.deepdense(deep.build()?);
    }

    if let Some(text) = &prepared.text {
        let mut deep = DeepText::builder(text.vocab_size()?)
            .rnn_type(model_spec.rnn_type)
            .hidden_dim(model_spec.rnn_hidden_dim)
            .n_layers(model_spec.rnn_layers)
            .bidirectional(model_spec.bidirectional)
            .embed_dim(model_spec.word_embed_dim);
        if let Some(s) = offset(3) {
            deep = deep.seed(s);
        }
        builder = builder.deeptext(deep.build()?);
    }

    if !model_spec.deephead.is_empty() {
        builder = builder
            .deephead(model_spec.deephead.clone())
            .deephead_dropout(model_spec.deephead_dropout.clone());
    }
    builder.build()
}

fn objective(spec: &ExperimentSpec) -> Result<Objective> {
    spec.training.objective().ok_or_else(|| {
        Error::InvalidConfig("multiclass objective needs 'n_classes'".into())
    })
}

/// Trainer with the configured optimizers, schedulers, metrics and callbacks
///
/// `steps_per_epoch` sizes batch-wise schedules such as `onecycle`.
pub fn build_trainer(
    spec: &ExperimentSpec,
    model: WideDeep,
    steps_per_epoch: usize,
) -> Result<Trainer> {
    let mut trainer = Trainer::new(model, objective(spec)?);

    for (group, optim) in &spec.optimizers {
        trainer.set_optimizer(group.as_str(), build_optimizer(optim)?);
    }
    let total_steps = steps_per_epoch * spec.training.epochs;
    for (group, sched) in &spec.schedulers {
        let lr = spec.optimizers.get(group).map_or(DEFAULT_LR, |o| o.lr);
        trainer.set_lr_scheduler(group.as_str(), build_scheduler(sched, lr, total_steps)?);
    }

    for name in &spec.training.metrics {
        trainer.metrics.push(build_metric(name)?);
    }
    for callback in build_callbacks(&spec.callbacks) {
        trainer.callbacks_mut().add_boxed(callback);
    }
    if let Some(max_norm) = spec.training.grad_clip {
        trainer = trainer.with_max_grad_norm(max_norm);
    }
    Ok(trainer)
}

/// Outcome of a configured run
pub struct Experiment {
    pub trainer: Trainer,
    pub result: TrainResult,
    pub prepared: PreparedData,
}

/// Prepare the data, build the model and train it
pub fn train_from_spec(spec: &ExperimentSpec, verbose: bool) -> Result<Experiment> {
    let prepared = prepare_data(spec)?;
    let model = build_model(spec, &prepared)?;
    let options = spec.training.fit_options();

    let (train, val) = if options.val_split > 0.0 {
        let (train, val) = prepared.dataset.split(options.val_split, options.seed)?;
        (train, Some(val))
    } else {
        (prepared.dataset.clone(), None)
    };

    let mut trainer =
        build_trainer(spec, model, train.num_batches(options.batch_size))?.with_verbose(verbose);
    let groups = if spec.optimizers.contains_key(MODEL_GROUP) {
        vec![MODEL_GROUP]
    } else {
        trainer.model().component_names()
    };
    info!(?groups, epochs = options.n_epochs, "starting configured run");

    let result = match &val {
        Some(val) => trainer.fit_with_validation(&train, val, &options)?,
        None => trainer.fit(&train, &options)?,
    };

    if let Some(output) = &spec.training.output {
        trainer.save_weights(output)?;
        info!(path = %output.display(), "weights saved");
    }
    Ok(Experiment { trainer, result, prepared })
}

/// Train a model from a YAML experiment file
pub fn train_from_yaml<P: AsRef<Path>>(config_path: P) -> Result<Experiment> {
    let spec = load_config(config_path)?;
    train_from_spec(&spec, false)
}
