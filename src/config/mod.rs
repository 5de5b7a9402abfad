//! Declarative YAML configuration
//!
//! An experiment file names the CSV, the columns feeding each component, the
//! architecture, the objective and the optimizer/scheduler per parameter group.
//!
//! # Example
//!
//! ```yaml
//! data:
//!   csv: adult.csv
//!   target: income_label
//!   wide_cols: [education, relationship, workclass]
//!   crossed_cols: [[education, occupation]]
//!   embed_cols: [[education, 16], [occupation, 16], workclass]
//!   continuous_cols: [age, hours_per_week]
//! model:
//!   hidden_layers: [64, 32]
//!   dropout: [0.5, 0.5]
//! training:
//!   objective: binary
//!   epochs: 10
//!   batch_size: 256
//!   val_split: 0.2
//!   metrics: [acc]
//! optimizers:
//!   wide: { name: sgd, lr: 0.01, momentum: 0.9 }
//!   deepdense: { name: adam, lr: 0.001 }
//! schedulers:
//!   wide: { name: cyclic, base_lr: 0.001, max_lr: 0.01, step_size_up: 50 }
//! callbacks:
//!   early_stopping: { monitor: val_loss, patience: 3 }
//!   lr_history: true
//! ```

mod builder;
mod cli;
mod schema;
mod train;
mod validate;

pub use builder::{
    build_callbacks, build_metric, build_optimizer, build_scheduler, OPTIMIZERS, SCHEDULERS,
};
pub use cli::{apply_overrides, parse_args, Cli, Command, TrainArgs, ValidateArgs};
pub use schema::{
    CallbacksSpec, CheckpointSpec, DataSpec, EarlyStoppingSpec, EmbedColSpec, ExperimentSpec,
    ModelSpec, ObjectiveKind, OptimSpec, SchedulerSpec, TextSpec, TrainingSpec, DEFAULT_EMBED_DIM,
};
pub use train::{
    build_model, build_trainer, load_config, prepare_data, prepare_frame, train_from_spec,
    train_from_yaml, Experiment, PreparedData,
};
pub use validate::{configured_components, validate_config, ValidationError};
