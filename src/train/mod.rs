//! High-level training loop
//!
//! This module provides the training framework for wide & deep models:
//! - Loss functions (MSE, BCE with logits, Cross-Entropy)
//! - Evaluation metrics (Accuracy, Precision, Recall, F1, R²)
//! - Objectives tying a loss to an output activation
//! - The [`Trainer`] with per-component optimizers and schedulers
//! - Callbacks (history, learning-rate history, early stopping, checkpoints)
//!
//! # Example
//!
//! ```no_run
//! use widedeep::data::{ModelInput, WideDeepDataset};
//! use widedeep::models::{Wide, WideDeep};
//! use widedeep::train::{Accuracy, EarlyStopping, FitOptions, Objective, Trainer};
//! use ndarray::{Array1, Array2};
//!
//! let model = WideDeep::builder().wide(Wide::new(10, 1)).build().unwrap();
//! let input = ModelInput::new().with_wide(Array2::ones((20, 3)));
//! let dataset = WideDeepDataset::new(input, Array1::zeros(20)).unwrap();
//!
//! let mut trainer = Trainer::new(model, Objective::Binary);
//! trainer.add_metric(Accuracy::default());
//! trainer.add_callback(EarlyStopping::new("val_loss").with_patience(2));
//!
//! let options = FitOptions::default().with_epochs(10).with_val_split(0.2);
//! let result = trainer.fit(&dataset, &options).unwrap();
//! println!("Trained {} epochs, final loss: {:.4}", result.epochs_run, result.final_loss);
//! ```

pub mod callback;
mod loss;
mod metrics;
mod objective;
mod trainer;

pub use callback::{
    CallbackAction, CallbackContext, CallbackManager, EarlyStopping, History, LRHistory,
    ModelCheckpoint, MonitorMode, ProgressCallback, TrainerCallback,
};
pub use loss::{softmax_rows, BCEWithLogitsLoss, CrossEntropyLoss, LossFn, MSELoss};
pub use metrics::{Accuracy, F1Score, Metric, Precision, R2Score, Recall};
pub use objective::Objective;
pub use trainer::{FitOptions, TrainResult, Trainer, DEFAULT_LR, MODEL_GROUP};
