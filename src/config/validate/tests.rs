//! Unit tests for configuration validation

use super::error::ValidationError;
use super::validator::{configured_components, validate_config};
use crate::config::schema::*;
use std::collections::HashMap;
use std::path::PathBuf;

fn create_valid_spec() -> ExperimentSpec {
    ExperimentSpec {
        data: DataSpec {
            csv: PathBuf::from("adult.csv"),
            target: "income_label".to_string(),
            wide_cols: vec!["education".into(), "relationship".into()],
            crossed_cols: vec![("education".into(), "occupation".into())],
            embed_cols: vec![EmbedColSpec::WithDim("workclass".into(), 8)],
            continuous_cols: vec!["age".into()],
            scale: true,
            text_col: None,
            text: TextSpec::default(),
        },
        model: ModelSpec::default(),
        training: TrainingSpec::default(),
        optimizers: Default::default(),
        schedulers: Default::default(),
        callbacks: CallbacksSpec::default(),
    }
}

fn optim(name: &str, lr: f32) -> OptimSpec {
    OptimSpec { name: name.to_string(), lr, params: HashMap::new() }
}

fn scheduler(name: &str) -> SchedulerSpec {
    SchedulerSpec { name: name.to_string(), params: HashMap::new() }
}

#[test]
fn test_valid_config() {
    assert!(validate_config(&create_valid_spec()).is_ok());
}

#[test]
fn test_configured_components() {
    let mut spec = create_valid_spec();
    assert_eq!(configured_components(&spec), vec!["wide", "deepdense"]);

    spec.data.text_col = Some("review".into());
    spec.model.deephead = vec![16];
    assert_eq!(configured_components(&spec), vec!["wide", "deepdense", "deeptext", "deephead"]);

    spec.data.embed_cols.clear();
    spec.data.continuous_cols.clear();
    spec.data.text_col = None;
    assert_eq!(configured_components(&spec), vec!["wide"]);
}

#[test]
fn test_no_input_columns() {
    let mut spec = create_valid_spec();
    spec.data.wide_cols.clear();
    spec.data.crossed_cols.clear();
    spec.data.embed_cols.clear();
    spec.data.continuous_cols.clear();
    assert!(matches!(validate_config(&spec), Err(ValidationError::NoInputColumns)));
}

#[test]
fn test_target_used_as_input() {
    let mut spec = create_valid_spec();
    spec.data.continuous_cols.push("income_label".into());
    let err = validate_config(&spec).unwrap_err();
    assert!(matches!(err, ValidationError::TargetAsInput(ref c) if c == "income_label"));
}

#[test]
fn test_zero_embed_dim() {
    let mut spec = create_valid_spec();
    spec.data.embed_cols.push(EmbedColSpec::WithDim("native_country".into(), 0));
    assert!(matches!(validate_config(&spec), Err(ValidationError::ZeroEmbedDim(_))));
}

#[test]
fn test_invalid_batch_size() {
    let mut spec = create_valid_spec();
    spec.training.batch_size = 0;
    let err = validate_config(&spec).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidBatchSize(0)));
}

#[test]
fn test_invalid_epochs() {
    let mut spec = create_valid_spec();
    spec.training.epochs = 0;
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidEpochs(0))));
}

#[test]
fn test_invalid_val_split() {
    let mut spec = create_valid_spec();
    spec.training.val_split = 1.0;
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidValSplit(_))));
    spec.training.val_split = -0.1;
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidValSplit(_))));
}

#[test]
fn test_multiclass_needs_classes() {
    let mut spec = create_valid_spec();
    spec.training.objective = ObjectiveKind::Multiclass;
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidClasses(None))));
    spec.training.n_classes = Some(1);
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidClasses(Some(1)))));
    spec.training.n_classes = Some(4);
    assert!(validate_config(&spec).is_ok());
}

#[test]
fn test_invalid_dropout() {
    let mut spec = create_valid_spec();
    spec.model.dropout = vec![0.5, 1.0];
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidDropout(_))));
}

#[test]
fn test_zero_width_layer() {
    let mut spec = create_valid_spec();
    spec.model.hidden_layers = vec![32, 0];
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::ZeroWidthLayer("hidden_layers"))
    ));
}

#[test]
fn test_invalid_grad_clip() {
    let mut spec = create_valid_spec();
    spec.training.grad_clip = Some(0.0);
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidGradClip(_))));
}

#[test]
fn test_invalid_metric() {
    let mut spec = create_valid_spec();
    spec.training.metrics = vec!["acc".into(), "auc".into()];
    let err = validate_config(&spec).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidMetric(ref m) if m == "auc"));
}

#[test]
fn test_invalid_optimizer() {
    let mut spec = create_valid_spec();
    spec.optimizers.insert("wide".into(), optim("lamb", 0.01));
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidOptimizer(_))));
}

#[test]
fn test_invalid_learning_rate() {
    let mut spec = create_valid_spec();
    spec.optimizers.insert("deepdense".into(), optim("adam", 0.0));
    let err = validate_config(&spec).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidLearningRate { ref group, .. } if group == "deepdense"));

    spec.optimizers.insert("deepdense".into(), optim("adam", 1.5));
    assert!(validate_config(&spec).is_err());
}

#[test]
fn test_optimizer_for_missing_component() {
    let mut spec = create_valid_spec();
    spec.optimizers.insert("deeptext".into(), optim("adam", 0.01));
    let err = validate_config(&spec).unwrap_err();
    assert!(matches!(err, ValidationError::UnknownGroup(ref g) if g == "deeptext"));
}

#[test]
fn test_model_group_is_exclusive() {
    let mut spec = create_valid_spec();
    spec.optimizers.insert("model".into(), optim("sgd", 0.01));
    assert!(validate_config(&spec).is_ok());

    spec.optimizers.insert("wide".into(), optim("sgd", 0.01));
    assert!(matches!(validate_config(&spec), Err(ValidationError::MixedGroups)));
}

#[test]
fn test_scheduler_groups() {
    let mut spec = create_valid_spec();
    spec.schedulers.insert("wide".into(), scheduler("cyclic"));
    assert!(validate_config(&spec).is_ok());

    spec.schedulers.insert("model".into(), scheduler("step"));
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::SchedulerWithoutOptimizer(_))
    ));

    let mut spec = create_valid_spec();
    spec.optimizers.insert("model".into(), optim("sgd", 0.01));
    spec.schedulers.insert("wide".into(), scheduler("step"));
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::SchedulerWithoutOptimizer(_))
    ));
}

#[test]
fn test_invalid_scheduler() {
    let mut spec = create_valid_spec();
    spec.schedulers.insert("wide".into(), scheduler("cosine"));
    assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidLRScheduler(_))));
}

#[test]
fn test_invalid_checkpoint_period() {
    let mut spec = create_valid_spec();
    spec.callbacks.checkpoint = Some(CheckpointSpec {
        filepath: PathBuf::from("out/wd"),
        monitor: "val_loss".into(),
        save_best_only: false,
        mode: Default::default(),
        period: 0,
        max_save: 0,
    });
    assert!(matches!(
        validate_config(&spec),
        Err(ValidationError::InvalidCheckpointPeriod(0))
    ));
}

#[test]
fn test_error_messages() {
    let err = ValidationError::InvalidLearningRate { group: "wide".into(), lr: 2.0 };
    assert!(err.to_string().contains("'wide'"));
    let err = ValidationError::InvalidBatchSize(0);
    assert!(err.to_string().contains("must be > 0"));
}
