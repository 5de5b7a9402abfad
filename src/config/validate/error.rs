//! Validation error types

/// Validation error type
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Data file does not exist: {0}")]
    CsvNotFound(String),

    #[error("Target column name is empty")]
    EmptyTarget,

    #[error("No input columns configured (wide, crossed, embed, continuous or text)")]
    NoInputColumns,

    #[error("Column '{0}' is used as both target and input")]
    TargetAsInput(String),

    #[error("Invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Invalid validation split: {0} (must be in [0.0, 1.0))")]
    InvalidValSplit(f32),

    #[error("Invalid validation frequency: {0} (must be > 0)")]
    InvalidValidationFreq(usize),

    #[error("Invalid number of classes: {0:?} (multiclass needs n_classes >= 2)")]
    InvalidClasses(Option<usize>),

    #[error("Invalid dropout: {0} (must be in [0.0, 1.0))")]
    InvalidDropout(f32),

    #[error("Invalid layer width: 0 in {0}")]
    ZeroWidthLayer(&'static str),

    #[error("Invalid embedding dimension for '{0}': 0")]
    ZeroEmbedDim(String),

    #[error("Invalid text settings: maxlen and max_vocab must be > 0")]
    InvalidTextSettings,

    #[error("Invalid learning rate for '{group}': {lr} (must be > 0.0 and <= 1.0)")]
    InvalidLearningRate { group: String, lr: f32 },

    #[error("Invalid optimizer: {0} (must be one of: sgd, adam, adamw, radam, rmsprop)")]
    InvalidOptimizer(String),

    #[error("Invalid LR scheduler: {0} (must be one of: step, multistep, exponential, plateau, cyclic, onecycle)")]
    InvalidLRScheduler(String),

    #[error("Unknown parameter group '{0}' (must be 'model' or a configured component)")]
    UnknownGroup(String),

    #[error("The 'model' optimizer cannot be combined with per-component optimizers")]
    MixedGroups,

    #[error("Scheduler for '{0}' has no optimizer to drive")]
    SchedulerWithoutOptimizer(String),

    #[error("Invalid gradient clip value: {0} (must be > 0.0)")]
    InvalidGradClip(f32),

    #[error("Unknown metric: {0} (must be one of: acc, prec, rec, f1, r2)")]
    InvalidMetric(String),

    #[error("Invalid checkpoint period: {0} (must be > 0)")]
    InvalidCheckpointPeriod(usize),
}
