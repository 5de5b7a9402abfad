//! # widedeep
//!
//! Wide & deep models for tabular, text and image data.
//!
//! A linear *wide* component over sparse categorical features is combined with
//! one or more *deep* sub-networks (dense, text, image) into a joint model that
//! is trained end to end. Training is driven by [`train::Trainer`], which fires
//! callbacks at batch and epoch boundaries for history tracking, early stopping,
//! checkpointing and learning-rate logging.
//!
//! # Example
//!
//! ```no_run
//! use widedeep::data::{ModelInput, WideDeepDataset};
//! use widedeep::models::{DeepDense, Wide, WideDeep};
//! use widedeep::train::{EarlyStopping, FitOptions, Objective, Trainer};
//! use ndarray::{Array1, Array2};
//! use std::collections::BTreeMap;
//!
//! let wide = Wide::new(10, 1);
//! let deepdense = DeepDense::builder()
//!     .column_idx(BTreeMap::from([("age".to_string(), 0)]))
//!     .continuous_cols(vec!["age".to_string()])
//!     .hidden_layers(vec![16, 8])
//!     .build()
//!     .unwrap();
//! let model = WideDeep::builder().wide(wide).deepdense(deepdense).build().unwrap();
//!
//! let input = ModelInput::new()
//!     .with_wide(Array2::ones((4, 2)))
//!     .with_deep(Array2::zeros((4, 1)));
//! let dataset = WideDeepDataset::new(input, Array1::zeros(4)).unwrap();
//!
//! let mut trainer = Trainer::new(model, Objective::Binary);
//! trainer.add_callback(EarlyStopping::new("val_loss").with_patience(3));
//! let result = trainer.fit(&dataset, &FitOptions::default().with_val_split(0.25)).unwrap();
//! println!("trained {} epochs", result.epochs_run);
//! ```

pub mod autograd;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod models;
pub mod nn;
pub mod optim;
pub mod preprocessing;
pub mod train;

pub use autograd::Tensor;
pub use error::{Error, Result};
