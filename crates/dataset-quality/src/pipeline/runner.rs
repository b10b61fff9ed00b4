//! Sequential run over a data directory.
//!
//! Each table is resolved, loaded and validated to completion before the
//! next one starts. A failure is recorded against its table and never stops
//! the remaining tables.

use super::discovery::{DataFile, discover_data_files};
use crate::config::QualityConfig;
use crate::error::{QualityError, Result};
use crate::loader::{ParseFailure, RecordLoader};
use crate::quality::DatasetValidator;
use crate::schema::SchemaSet;
use crate::table::Table;
use crate::types::{QualityReport, Record};
use chrono::Local;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// What happened to one table.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableStatus {
    /// All checks ran (some may report skips).
    Checked { report: QualityReport },
    /// The file held no parseable record.
    Empty,
    /// The table could not be checked.
    Failed { error: QualityError },
}

/// Loading statistics for one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadSummary {
    pub records: usize,
    pub failures: Vec<ParseFailure>,
}

/// Result of checking one dataset file.
#[derive(Debug, Serialize)]
pub struct TableResult {
    pub table: String,
    pub file: PathBuf,
    pub load: LoadSummary,
    pub status: TableStatus,
}

impl TableResult {
    pub fn report(&self) -> Option<&QualityReport> {
        match &self.status {
            TableStatus::Checked { report } => Some(report),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&QualityError> {
        match &self.status {
            TableStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Every table result of one `check` run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub generated_at: String,
    pub data_dir: PathBuf,
    pub tables: Vec<TableResult>,
}

impl RunReport {
    pub fn table(&self, name: &str) -> Option<&TableResult> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn failed_tables(&self) -> impl Iterator<Item = &TableResult> {
        self.tables.iter().filter(|t| t.error().is_some())
    }

    pub fn has_failures(&self) -> bool {
        self.failed_tables().next().is_some()
    }
}

/// First record of one dataset file.
#[derive(Debug, Serialize)]
pub struct SampleResult {
    pub table: String,
    pub file: PathBuf,
    /// `None` when no line of the file parses.
    pub record: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<QualityError>,
}

/// Drives sampling and checking over the configured data directory.
pub struct QualityRunner {
    config: QualityConfig,
    schemas: SchemaSet,
    loader: RecordLoader,
}

impl QualityRunner {
    /// Create a runner, loading the schema file when one is configured.
    pub fn new(config: QualityConfig) -> Result<Self> {
        let schemas = match &config.schema_file {
            Some(path) => SchemaSet::from_json_file(path)?,
            None => SchemaSet::builtin().clone(),
        };
        Self::with_schemas(config, schemas)
    }

    /// Create a runner with an explicit schema set.
    pub fn with_schemas(config: QualityConfig, schemas: SchemaSet) -> Result<Self> {
        config.validate()?;
        debug!(
            "Known tables: {}",
            schemas.table_names().collect::<Vec<_>>().join(", ")
        );
        let loader = RecordLoader::new(config.snippet_chars);
        Ok(Self {
            config,
            schemas,
            loader,
        })
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    fn data_files(&self) -> Result<Vec<DataFile>> {
        let files: Vec<DataFile> = discover_data_files(&self.config.data_dir)?
            .into_iter()
            .filter(|f| self.config.includes_table(&f.table))
            .collect();

        for wanted in &self.config.tables {
            if !files.iter().any(|f| &f.table == wanted) {
                warn!(
                    "No {}.json.gz in {}",
                    wanted,
                    self.config.data_dir.display()
                );
            }
        }

        Ok(files)
    }

    /// Read the first valid record of every dataset file.
    pub fn sample(&self) -> Result<Vec<SampleResult>> {
        let files = self.data_files()?;
        info!("Sampling {} dataset files", files.len());

        let samples = files
            .into_iter()
            .map(|file| {
                let (record, error) = match self.loader.first_record(&file.path) {
                    Ok(record) => (record, None),
                    Err(e) => {
                        error!("Failed to sample {}: {}", file.path.display(), e);
                        (None, Some(e))
                    }
                };
                SampleResult {
                    table: file.table,
                    file: file.path,
                    record,
                    error,
                }
            })
            .collect();

        Ok(samples)
    }

    /// Check every dataset file against its schema.
    pub fn check(&self) -> Result<RunReport> {
        let files = self.data_files()?;
        info!(
            "Checking {} tables in {}",
            files.len(),
            self.config.data_dir.display()
        );

        let tables = files.iter().map(|file| self.check_file(file)).collect();

        Ok(RunReport {
            generated_at: Local::now().to_rfc3339(),
            data_dir: self.config.data_dir.clone(),
            tables,
        })
    }

    /// Check one dataset file. Never fails: errors land in the result.
    pub fn check_file(&self, file: &DataFile) -> TableResult {
        info!("Checking {}", file.table);
        let mut load = LoadSummary::default();

        let status = match self.check_table(file, &mut load) {
            Ok(Some(report)) => TableStatus::Checked { report },
            Ok(None) => {
                warn!("No valid records found in {}", file.path.display());
                TableStatus::Empty
            }
            Err(error) => {
                error!("Table {} failed: {}", file.table, error);
                TableStatus::Failed { error }
            }
        };

        TableResult {
            table: file.table.clone(),
            file: file.path.clone(),
            load,
            status,
        }
    }

    fn check_table(&self, file: &DataFile, load: &mut LoadSummary) -> Result<Option<QualityReport>> {
        // Resolve the schema before reading anything
        let schema = self.schemas.get(&file.table)?;

        let outcome = self.loader.load_records(&file.path)?;
        load.records = outcome.records.len();
        load.failures = outcome.failures;
        if outcome.records.is_empty() {
            return Ok(None);
        }

        let mut table = Table::from_records(&file.table, outcome.records);
        for rename in &schema.renames {
            table.rename_column(&rename.from, &rename.to);
        }

        DatasetValidator::validate(&table, schema).map(Some)
    }
}
