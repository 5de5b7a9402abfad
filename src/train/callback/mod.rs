//! Callback system for training events
//!
//! Provides extensible hooks for training loop events:
//! - `on_train_begin` / `on_train_end`
//! - `on_epoch_begin` / `on_epoch_end`
//! - `on_batch_begin` / `on_batch_end`
//!
//! # Example
//!
//! ```rust
//! use widedeep::train::callback::{CallbackAction, CallbackContext, TrainerCallback};
//! use widedeep::Result;
//!
//! struct PrintCallback;
//!
//! impl TrainerCallback for PrintCallback {
//!     fn on_epoch_end(&mut self, ctx: &CallbackContext) -> Result<CallbackAction> {
//!         println!("Epoch {} finished with loss {:.4}", ctx.epoch, ctx.loss);
//!         Ok(CallbackAction::Continue)
//!     }
//! }
//! ```

mod checkpoint;
mod early_stopping;
mod history;
mod lr_history;
mod manager;
mod monitor;
mod progress;
mod traits;

pub use checkpoint::ModelCheckpoint;
pub use early_stopping::EarlyStopping;
pub use history::History;
pub use lr_history::LRHistory;
pub use manager::CallbackManager;
pub use monitor::MonitorMode;
pub use progress::ProgressCallback;
pub use traits::{CallbackAction, CallbackContext, TrainerCallback};
