//! Dataset Quality Library
//!
//! Loads gzip-compressed, newline-delimited JSON tables and reports data
//! quality problems against per-table schemas, built on Polars.
//!
//! # Overview
//!
//! - **Record Loading**: Streams `.json.gz` files line by line; malformed lines are
//!   reported and skipped, never fatal
//! - **Tabular View**: Heterogeneous records become a table whose columns are the
//!   union of all keys, with absent keys as nulls
//! - **Quality Checks**: Missing values, duplicate keys, type mismatches, numeric
//!   ranges and categorical validity
//! - **Explicit Skips**: Every check that cannot run says why instead of reporting zero
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dataset_quality::{QualityConfig, QualityRunner, ReportPrinter};
//!
//! let config = QualityConfig::builder()
//!     .data_dir("data")
//!     .table("receipts")
//!     .build()?;
//!
//! let report = QualityRunner::new(config)?.check()?;
//!
//! let mut printer = ReportPrinter::new(std::io::stdout().lock());
//! printer.print_run(&report)?;
//!
//! if report.has_failures() {
//!     eprintln!("Some tables could not be checked");
//! }
//! ```
//!
//! # Checking a single table
//!
//! The building blocks can be used without a data directory:
//!
//! ```rust,ignore
//! use dataset_quality::{DatasetValidator, RecordLoader, SchemaSet, Table};
//!
//! let schema = SchemaSet::builtin().get("users")?;
//! let outcome = RecordLoader::default().load_records("users.json.gz".as_ref())?;
//! let table = Table::from_records("users", outcome.records);
//! let report = DatasetValidator::validate(&table, schema)?;
//!
//! println!("Duplicates: {:?}", report.duplicates.outcome);
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod quality;
pub mod reporting;
pub mod schema;
pub mod table;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, QualityConfig, QualityConfigBuilder};
pub use error::{QualityError, Result as QualityResult, ResultExt};
pub use loader::{FailureKind, LoadOutcome, ParseFailure, RecordLoader, RecordReader};
pub use pipeline::{QualityRunner, RunReport, SampleResult, TableResult, TableStatus};
pub use quality::DatasetValidator;
pub use reporting::ReportPrinter;
pub use schema::{SchemaSet, TableSchema, TableSchemaBuilder};
pub use table::Table;
pub use types::{
    CheckOutcome, QualityReport, Record, ScalarKind, SkipReason, TypeViolation, ValueKind,
};
