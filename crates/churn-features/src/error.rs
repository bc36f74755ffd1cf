//! Error types for the feature pipeline.
//!
//! Every stage of the pipeline is total over well-typed cells, so the only
//! failures that propagate to a caller are input parsing problems, I/O and
//! invalid contracts. Ambiguous cell values are resolved with documented
//! defaults inside the stages and never surface here.
//!
//! Errors are serializable as `{ code, message }` so they can be embedded in
//! JSON responses.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the feature pipeline.
#[derive(Error, Debug)]
pub enum FeatureError {
    /// The raw input could not be turned into a table at all.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A table was constructed with columns of different lengths.
    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Invalid feature contract.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Report or feature file generation failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FeatureError>,
    },
}

impl FeatureError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        FeatureError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for API consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "MALFORMED_INPUT",
            Self::RaggedColumn { .. } => "RAGGED_COLUMN",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by input that could not be read or
    /// parsed into a table, rather than by configuration or output.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::MalformedInput(_) | Self::RaggedColumn { .. } | Self::Json(_) | Self::Io(_) => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }
}

impl Serialize for FeatureError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("FeatureError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| FeatureError::Polars(e).with_context(context))
    }
}
