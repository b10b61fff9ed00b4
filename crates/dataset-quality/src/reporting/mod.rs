//! Report output module.
//!
//! [`ReportPrinter`] writes run results to any `std::io::Write`:
//! - human-readable text, one block per table (default)
//! - pretty JSON of the whole run report (`--json` CLI flag)
//!
//! # Example
//!
//! ```rust,ignore
//! use dataset_quality::reporting::ReportPrinter;
//!
//! let report = runner.check()?;
//! let mut printer = ReportPrinter::new(std::io::stdout().lock());
//! printer.print_run(&report)?;
//! ```

mod printer;

pub use printer::ReportPrinter;
