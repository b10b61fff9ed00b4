//! Run configuration.
//!
//! The data directory is resolved from an explicit value, then the
//! [`DATA_DIR_ENV`] environment variable, then [`DEFAULT_DATA_DIR`].

use crate::loader::DEFAULT_SNIPPET_CHARS;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "DATASET_QUALITY_DATA_DIR";

/// Data directory used when nothing else is configured.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Configuration for sampling and checking a data directory.
///
/// Use [`QualityConfig::builder()`] to create a new configuration.
///
/// # Example
///
/// ```rust,ignore
/// use dataset_quality::config::QualityConfig;
///
/// let config = QualityConfig::builder()
///     .data_dir("fixtures/data")
///     .table("receipts")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Directory holding `<table>.json.gz` files.
    /// Default: `$DATASET_QUALITY_DATA_DIR`, else "data"
    pub data_dir: PathBuf,

    /// JSON file replacing the built-in schemas.
    /// Default: None
    pub schema_file: Option<PathBuf>,

    /// Only check these tables. Empty means every file found.
    /// Default: empty
    pub tables: Vec<String>,

    /// Characters of a malformed line kept in its diagnostic.
    /// Default: 100
    pub snippet_chars: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            schema_file: None,
            tables: Vec::new(),
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }
}

fn default_data_dir() -> PathBuf {
    data_dir_from_env(std::env::var_os(DATA_DIR_ENV))
}

/// An unset or empty variable falls back to [`DEFAULT_DATA_DIR`].
fn data_dir_from_env(value: Option<OsString>) -> PathBuf {
    value
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

impl QualityConfig {
    /// Create a new configuration builder.
    pub fn builder() -> QualityConfigBuilder {
        QualityConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyDataDir);
        }

        if self.snippet_chars == 0 {
            return Err(ConfigValidationError::InvalidSnippetChars(self.snippet_chars));
        }

        if let Some(table) = self.tables.iter().find(|t| t.trim().is_empty()) {
            return Err(ConfigValidationError::InvalidTableName(table.clone()));
        }

        Ok(())
    }

    /// Whether `table` passes the table filter.
    pub fn includes_table(&self, table: &str) -> bool {
        self.tables.is_empty() || self.tables.iter().any(|t| t == table)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Data directory must not be empty")]
    EmptyDataDir,

    #[error("Invalid snippet length: {0} (must be at least 1)")]
    InvalidSnippetChars(usize),

    #[error("Invalid table name: '{0}'")]
    InvalidTableName(String),
}

/// Builder for [`QualityConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct QualityConfigBuilder {
    data_dir: Option<PathBuf>,
    schema_file: Option<PathBuf>,
    tables: Vec<String>,
    snippet_chars: Option<usize>,
}

impl QualityConfigBuilder {
    /// Set the data directory, overriding the environment default.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Replace the built-in schemas with a JSON schema file.
    pub fn schema_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_file = Some(path.into());
        self
    }

    /// Restrict the run to `table`. May be called repeatedly.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.tables.push(table.into());
        self
    }

    /// Set how much of a malformed line is kept in diagnostics.
    pub fn snippet_chars(mut self, chars: usize) -> Self {
        self.snippet_chars = Some(chars);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `QualityConfig` or an error if validation fails.
    pub fn build(self) -> Result<QualityConfig, ConfigValidationError> {
        let config = QualityConfig {
            data_dir: self.data_dir.unwrap_or_else(default_data_dir),
            schema_file: self.schema_file,
            tables: self.tables,
            snippet_chars: self.snippet_chars.unwrap_or(DEFAULT_SNIPPET_CHARS),
        };

        config.validate()?;
        Ok(config)
    }
}
