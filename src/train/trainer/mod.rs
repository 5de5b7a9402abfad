//! Trainer for wide & deep models
//!
//! - Per-component optimizers and learning-rate schedulers
//! - Epoch loop with validation, metrics and callbacks
//! - Prediction and weight persistence
//!
//! # Example
//!
//! ```no_run
//! use widedeep::data::{ModelInput, WideDeepDataset};
//! use widedeep::models::{Wide, WideDeep};
//! use widedeep::train::{FitOptions, LRHistory, Objective, Trainer};
//! use widedeep::optim::StepLR;
//! use ndarray::{Array1, Array2};
//!
//! let model = WideDeep::builder().wide(Wide::new(10, 1)).build().unwrap();
//! let input = ModelInput::new().with_wide(Array2::ones((8, 2)));
//! let dataset = WideDeepDataset::new(input, Array1::zeros(8)).unwrap();
//!
//! let mut trainer = Trainer::new(model, Objective::Regression)
//!     .with_lr_scheduler("wide", StepLR::new(0.01, 2, 0.5));
//! trainer.add_callback(LRHistory::new());
//! let result = trainer.fit(&dataset, &FitOptions::default().with_epochs(4)).unwrap();
//! assert_eq!(trainer.history().len(), result.epochs_run);
//! ```

mod core;
mod fit;
mod options;
mod predict;
mod result;


pub use core::{Trainer, DEFAULT_LR, MODEL_GROUP};
pub use options::FitOptions;
pub use result::TrainResult;
