//! Error types
//!
//! Every variant carries enough context to act on without reading the source.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for widedeep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building, training or persisting wide & deep models
#[derive(Error, Debug)]
pub enum Error {
    /// A preprocessor was used before `fit`
    #[error("This {what} instance is not fitted yet\n  → Call 'fit' with appropriate arguments before using it")]
    NotFitted { what: &'static str },

    /// Tensor or input shapes disagree
    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch { context: String, expected: Vec<usize>, actual: Vec<usize> },

    /// Invalid model or training configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A column the caller asked for is absent from the frame
    #[error("Column '{0}' not found")]
    MissingColumn(String),

    /// A model component has no matching input
    #[error("Model has a '{component}' component but no '{component}' input was provided")]
    MissingInput { component: &'static str },

    /// Weight checkpoint could not be written or applied
    #[error("Checkpoint error for {path}: {message}")]
    Checkpoint { path: PathBuf, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a shape mismatch error
    pub fn shape(
        context: impl Into<String>,
        expected: impl Into<Vec<usize>>,
        actual: impl Into<Vec<usize>>,
    ) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Whether the error stems from caller input rather than the environment
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Checkpoint { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON: {e}"))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialization(format!("YAML: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_fitted_message() {
        let err = Error::NotFitted { what: "LabelEncoder" };
        let msg = err.to_string();
        assert!(msg.contains("LabelEncoder"));
        assert!(msg.contains("fit"));
    }

    #[test]
    fn test_shape_helper() {
        let err = Error::shape("deep input", vec![4, 3], vec![4, 2]);
        assert!(matches!(err, Error::ShapeMismatch { .. }));
        assert!(err.to_string().contains("[4, 3]"));
    }

    #[test]
    fn test_is_user_error() {
        assert!(Error::InvalidConfig("x".into()).is_user_error());
        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(!io.is_user_error());
    }

    #[test]
    fn test_from_yaml_error() {
        let yaml_err = serde_yaml::from_str::<Vec<u32>>("{not: a list").unwrap_err();
        let err: Error = yaml_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
