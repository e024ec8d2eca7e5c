//! Custom error types for customer dataset processing.
//!
//! This module provides the error hierarchy using `thiserror` for loading,
//! validating, imputing and analysing customer datasets.
//!
//! Errors are serializable as `{code, message}` so they can be emitted as
//! JSON by the command line front end.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for customer dataset processing.
#[derive(Error, Debug)]
pub enum InsightsError {
    /// A required column is absent from the source schema.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No known value exists in a column, so no global statistic can be computed.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// A column could not be read as the type its field requires.
    #[error("Failed to convert column '{column}' to {target_type}: {reason}")]
    TypeConversionFailed {
        column: String,
        target_type: String,
        reason: String,
    },

    /// Imputation left values missing.
    #[error("Failed to impute missing values in column '{column}': {reason}")]
    ImputationFailed { column: String, reason: String },

    /// The data source could not be reached or read.
    #[error("Data source unavailable: {0}")]
    SourceUnavailable(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error (only with the "remote" feature).
    #[cfg(feature = "remote")]
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<InsightsError>,
    },
}

impl InsightsError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        InsightsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::TypeConversionFailed { .. } => "TYPE_CONVERSION_FAILED",
            Self::ImputationFailed { .. } => "IMPUTATION_FAILED",
            Self::SourceUnavailable(_) => "SOURCE_UNAVAILABLE",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            #[cfg(feature = "remote")]
            Self::HttpRequest(_) => "HTTP_REQUEST_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if the caller can retry after fixing its inputs
    /// (configuration or source location) without the dataset changing.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidConfig(_) | Self::SourceUnavailable(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

impl Serialize for InsightsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("InsightsError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl From<crate::config::ConfigValidationError> for InsightsError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        InsightsError::InvalidConfig(err.to_string())
    }
}

/// Result type alias for customer dataset operations.
pub type Result<T> = std::result::Result<T, InsightsError>;

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
        self.map_err(|e| InsightsError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            InsightsError::ColumnNotFound("Edad".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(
            InsightsError::NoValidValues("Género".to_string()).error_code(),
            "NO_VALID_VALUES"
        );
    }

    #[test]
    fn test_is_recoverable() {
        assert!(InsightsError::InvalidConfig("bad".to_string()).is_recoverable());
        assert!(InsightsError::SourceUnavailable("offline".to_string()).is_recoverable());
        assert!(!InsightsError::ColumnNotFound("Edad".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_serialization() {
        let error = InsightsError::ColumnNotFound("Latitud".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Latitud"));
    }

    #[test]
    fn test_with_context() {
        let error = InsightsError::ColumnNotFound("Nombre".to_string())
            .with_context("While validating schema");
        assert!(error.to_string().contains("While validating schema"));
        // Preserves original code
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_context_preserves_recoverability() {
        let error = InsightsError::InvalidConfig("max_passes".to_string()).with_context("CLI");
        assert!(error.is_recoverable());
    }
}
