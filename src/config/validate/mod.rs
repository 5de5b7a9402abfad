//! Configuration validation
//!
//! Validates experiment specifications for correctness before execution.

mod error;
mod validator;

#[cfg(test)]
mod proptests;
#[cfg(test)]
mod tests;

pub use error::ValidationError;
pub use validator::{configured_components, validate_config};
