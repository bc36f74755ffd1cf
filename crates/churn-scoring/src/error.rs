//! Error types for the churn-scoring crate.
//!
//! This module defines [`ScoringError`], the error type returned by model
//! loading, configuration and scoring.
//!
//! # Example
//!
//! ```no_run
//! use churn_scoring::{LinearModel, ScoringError};
//!
//! fn load() -> Result<LinearModel, ScoringError> {
//!     // Errors are automatically propagated with ?
//!     let model = LinearModel::load("model.json")?;
//!     Ok(model)
//! }
//! ```

use thiserror::Error;

/// The main error type for churn-scoring operations.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ScoringError {
    /// The model definition is unusable.
    ///
    /// Common causes:
    /// - No coefficients
    /// - Non-finite intercept, coefficient or baseline values
    /// - A decision threshold outside `(0, 1)`
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// The model expects features the batch does not carry.
    ///
    /// The feature contract used by the pipeline must produce every feature
    /// the model was fit on.
    #[error("Feature mismatch: model requires {missing:?}, which the batch does not provide")]
    FeatureMismatch {
        /// Model features absent from the batch.
        missing: Vec<String>,
    },

    /// The specified model file was not found.
    #[error("Model not found: {path}")]
    ModelNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Invalid scoring configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error while reading a model file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The model file is not valid JSON for a [`LinearModel`](crate::LinearModel).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScoringError {
    /// Get the error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidModel(_) => "INVALID_MODEL",
            Self::FeatureMismatch { .. } => "FEATURE_MISMATCH",
            Self::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_mismatch_message() {
        let err = ScoringError::FeatureMismatch {
            missing: vec!["tenure".to_string()],
        };
        assert!(err.to_string().contains("tenure"));
        assert_eq!(err.error_code(), "FEATURE_MISMATCH");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ScoringError = json_err.into();
        assert_eq!(err.error_code(), "JSON_ERROR");
    }
}
