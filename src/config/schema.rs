//! YAML schema of a wide & deep experiment

use crate::nn::RnnType;
use crate::train::{FitOptions, MonitorMode, Objective};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Embedding dimension used when a categorical column names none
pub const DEFAULT_EMBED_DIM: usize = 32;

/// Complete experiment specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentSpec {
    /// Input columns and their preprocessing
    pub data: DataSpec,

    /// Architecture of the deep components
    #[serde(default)]
    pub model: ModelSpec,

    /// Objective and loop hyperparameters
    #[serde(default)]
    pub training: TrainingSpec,

    /// Optimizer per parameter group (`model` or a component name)
    #[serde(default)]
    pub optimizers: BTreeMap<String, OptimSpec>,

    /// Scheduler per parameter group
    #[serde(default)]
    pub schedulers: BTreeMap<String, SchedulerSpec>,

    #[serde(default)]
    pub callbacks: CallbacksSpec,
}

/// A categorical column fed to the deepdense embeddings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbedColSpec {
    /// Column name, embedded with [`DEFAULT_EMBED_DIM`]
    Name(String),
    /// `[column, embedding_dim]`
    WithDim(String, usize),
}

impl EmbedColSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::WithDim(name, _) => name,
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            Self::Name(_) => DEFAULT_EMBED_DIM,
            Self::WithDim(_, dim) => *dim,
        }
    }
}

/// Data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSpec {
    /// CSV file with a header row
    pub csv: PathBuf,

    /// Numeric target column
    pub target: String,

    /// Columns of the wide component
    #[serde(default)]
    pub wide_cols: Vec<String>,

    /// Column pairs crossed into extra wide features
    #[serde(default)]
    pub crossed_cols: Vec<(String, String)>,

    /// Categorical columns embedded by the deepdense component
    #[serde(default)]
    pub embed_cols: Vec<EmbedColSpec>,

    /// Numeric columns passed straight to the deepdense component
    #[serde(default)]
    pub continuous_cols: Vec<String>,

    /// Standardize continuous columns
    #[serde(default = "default_true")]
    pub scale: bool,

    /// Free-text column for the deeptext component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_col: Option<String>,

    #[serde(default)]
    pub text: TextSpec,
}

/// Tokenization of the text column
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSpec {
    /// Padded sequence length
    pub maxlen: usize,
    pub max_vocab: usize,
    /// Minimum token frequency to enter the vocabulary
    pub min_freq: usize,
}

impl Default for TextSpec {
    fn default() -> Self {
        Self { maxlen: 80, max_vocab: 30_000, min_freq: 5 }
    }
}

/// Architecture of the deep components
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSpec {
    /// Hidden widths of the deepdense MLP
    pub hidden_layers: Vec<usize>,
    pub dropout: Vec<f32>,
    pub batchnorm: bool,
    pub embed_dropout: f32,

    pub rnn_type: RnnType,
    pub rnn_hidden_dim: usize,
    pub rnn_layers: usize,
    pub bidirectional: bool,
    /// Word embedding width of the deeptext component
    pub word_embed_dim: usize,

    /// Hidden widths of the shared head over the deep outputs; empty disables it
    pub deephead: Vec<usize>,
    pub deephead_dropout: Vec<f32>,

    /// Seed for weight initialization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            hidden_layers: vec![64, 32],
            dropout: Vec::new(),
            batchnorm: false,
            embed_dropout: 0.0,
            rnn_type: RnnType::Lstm,
            rnn_hidden_dim: 64,
            rnn_layers: 1,
            bidirectional: false,
            word_embed_dim: 32,
            deephead: Vec::new(),
            deephead_dropout: Vec::new(),
            seed: None,
        }
    }
}

/// Objective name as written in YAML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveKind {
    Regression,
    #[default]
    Binary,
    Multiclass,
}

/// Training hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSpec {
    pub objective: ObjectiveKind,
    /// Number of classes, required for `multiclass`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_classes: Option<usize>,
    pub epochs: usize,
    pub batch_size: usize,
    pub val_split: f32,
    pub validation_freq: usize,
    pub seed: u64,
    pub shuffle: bool,
    /// Gradient clipping threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grad_clip: Option<f32>,
    /// Metric short names: `acc`, `prec`, `rec`, `f1`, `r2`
    pub metrics: Vec<String>,
    /// Where the final weights are written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl Default for TrainingSpec {
    fn default() -> Self {
        Self {
            objective: ObjectiveKind::default(),
            n_classes: None,
            epochs: 10,
            batch_size: 32,
            val_split: 0.0,
            validation_freq: 1,
            seed: 1,
            shuffle: true,
            grad_clip: None,
            metrics: Vec::new(),
            output: None,
        }
    }
}

impl TrainingSpec {
    /// Objective with its class count, `None` when `multiclass` lacks `n_classes`
    pub fn objective(&self) -> Option<Objective> {
        match self.objective {
            ObjectiveKind::Regression => Some(Objective::Regression),
            ObjectiveKind::Binary => Some(Objective::Binary),
            ObjectiveKind::Multiclass => self.n_classes.map(Objective::Multiclass),
        }
    }

    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            n_epochs: self.epochs,
            batch_size: self.batch_size,
            val_split: self.val_split,
            validation_freq: self.validation_freq,
            seed: self.seed,
            shuffle: self.shuffle,
        }
    }
}

/// Optimizer specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimSpec {
    /// Optimizer name: "sgd" | "adam" | "adamw" | "radam" | "rmsprop"
    pub name: String,

    /// Learning rate
    pub lr: f32,

    /// Optimizer-specific parameters (momentum, beta1, weight_decay, ...)
    #[serde(flatten)]
    pub params: HashMap<String, serde_json::Value>,
}

/// Scheduler specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSpec {
    /// Scheduler name: "step" | "multistep" | "exponential" | "plateau" | "cyclic" | "onecycle"
    pub name: String,

    /// Scheduler-specific parameters (step_size, gamma, max_lr, ...)
    #[serde(flatten)]
    pub params: HashMap<String, serde_json::Value>,
}

/// Optional callbacks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbacksSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub early_stopping: Option<EarlyStoppingSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<CheckpointSpec>,
    /// Record learning rates of scheduled groups
    pub lr_history: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EarlyStoppingSpec {
    pub monitor: String,
    pub min_delta: f32,
    pub patience: usize,
    pub mode: MonitorMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<f32>,
    pub restore_best_weights: bool,
}

impl Default for EarlyStoppingSpec {
    fn default() -> Self {
        Self {
            monitor: "val_loss".to_string(),
            min_delta: 0.0,
            patience: 10,
            mode: MonitorMode::Auto,
            baseline: None,
            restore_best_weights: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointSpec {
    /// File prefix; epochs are appended as `<filepath>_<epoch>.safetensors`
    pub filepath: PathBuf,
    #[serde(default = "default_monitor")]
    pub monitor: String,
    #[serde(default)]
    pub save_best_only: bool,
    #[serde(default)]
    pub mode: MonitorMode,
    #[serde(default = "default_period")]
    pub period: usize,
    /// Files kept on disk, 0 keeps all
    #[serde(default)]
    pub max_save: usize,
}

fn default_true() -> bool {
    true
}

fn default_monitor() -> String {
    "val_loss".to_string()
}

fn default_period() -> usize {
    1
}
