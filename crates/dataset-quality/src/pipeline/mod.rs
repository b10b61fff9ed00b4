//! Pipeline module.
//!
//! This module discovers dataset files and runs sampling and quality
//! checks over them, one table at a time.

mod discovery;
mod runner;

pub use discovery::{DataFile, discover_data_files};
pub use runner::{LoadSummary, QualityRunner, RunReport, SampleResult, TableResult, TableStatus};
