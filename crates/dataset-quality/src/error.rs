//! Custom error types for dataset quality checks.
//!
//! This module provides the error hierarchy using `thiserror`. Errors are
//! serializable so a failed table can be carried inside a JSON run report.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for loading and validating datasets.
#[derive(Error, Debug)]
pub enum QualityError {
    /// The configured data directory does not exist.
    #[error("Data directory '{}' does not exist", .0.display())]
    DataDirNotFound(PathBuf),

    /// The data directory holds no `.json.gz` files.
    #[error("No .json.gz files found in '{}'", .0.display())]
    NoDataFiles(PathBuf),

    /// A dataset file names a table with no schema.
    #[error("Unknown table '{0}': no schema is defined for it")]
    UnknownTable(String),

    /// A schema definition is inconsistent.
    #[error("Invalid schema for table '{table}': {reason}")]
    InvalidSchema { table: String, reason: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

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
        source: Box<QualityError>,
    },
}

impl QualityError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        QualityError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for machine-readable reports.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DataDirNotFound(_) => "DATA_DIR_NOT_FOUND",
            Self::NoDataFiles(_) => "NO_DATA_FILES",
            Self::UnknownTable(_) => "UNKNOWN_TABLE",
            Self::InvalidSchema { .. } => "INVALID_SCHEMA",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }
}

impl From<crate::config::ConfigValidationError> for QualityError {
    fn from(error: crate::config::ConfigValidationError) -> Self {
        QualityError::InvalidConfig(error.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for QualityError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("QualityError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for quality operations.
pub type Result<T> = std::result::Result<T, QualityError>;

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

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| QualityError::Io(e).with_context(context))
    }
}
