use crate::error::Result;
use crate::pipeline::{RunReport, SampleResult, TableResult, TableStatus};
use crate::types::{CheckOutcome, QualityReport};
use serde::Serialize;
use std::io::{self, Write};

const RULE_WIDTH: usize = 80;

/// Renders run results as human-readable text or JSON.
///
/// Each report section is written only when it has something to show.
pub struct ReportPrinter<W: Write> {
    out: W,
}

impl<W: Write> ReportPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write any serializable value as pretty JSON.
    pub fn print_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, value)?;
        writeln!(self.out)?;
        Ok(())
    }

    /// Write the first record of each sampled file.
    pub fn print_samples(&mut self, samples: &[SampleResult]) -> io::Result<()> {
        for sample in samples {
            let file_name = sample
                .file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| sample.table.clone());

            writeln!(self.out, "\n--- Reading from {} ---", file_name)?;
            match (&sample.record, &sample.error) {
                (_, Some(error)) => writeln!(self.out, "Could not read {}: {}", file_name, error)?,
                (Some(record), None) => {
                    let pretty = serde_json::to_string_pretty(record).map_err(io::Error::other)?;
                    writeln!(self.out, "{}", pretty)?;
                }
                (None, None) => writeln!(self.out, "No valid records found in {}.", file_name)?,
            }
        }
        Ok(())
    }

    /// Write a full `check` run: header, one block per table, summary.
    pub fn print_run(&mut self, report: &RunReport) -> io::Result<()> {
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(self.out, "DATA QUALITY REPORT")?;
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(self.out, "Data directory: {}", report.data_dir.display())?;
        writeln!(self.out, "Generated at: {}", report.generated_at)?;

        for result in &report.tables {
            self.print_table(result)?;
        }

        let checked = report.tables.iter().filter(|t| t.report().is_some()).count();
        let empty = report
            .tables
            .iter()
            .filter(|t| matches!(t.status, TableStatus::Empty))
            .count();
        let failed = report.failed_tables().count();

        writeln!(self.out)?;
        writeln!(self.out, "SUMMARY")?;
        writeln!(self.out, "{}", "-".repeat(40))?;
        writeln!(
            self.out,
            "  Tables checked: {}, empty: {}, failed: {}",
            checked, empty, failed
        )?;
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
        Ok(())
    }

    /// Write the block for one table.
    pub fn print_table(&mut self, result: &TableResult) -> io::Result<()> {
        writeln!(self.out, "\n--- Checking {} ---", result.table)?;

        if !result.load.failures.is_empty() {
            writeln!(
                self.out,
                "Skipped {} unparseable lines in {}",
                result.load.failures.len(),
                result.file.display()
            )?;
        }

        match &result.status {
            TableStatus::Checked { report } => self.print_quality_report(report),
            TableStatus::Empty => writeln!(
                self.out,
                "Warning: No valid records found in {}",
                result.file.display()
            ),
            TableStatus::Failed { error } => {
                writeln!(self.out, "ERROR [{}] {}", error.error_code(), error)
            }
        }
    }

    /// Write the findings of one quality report.
    pub fn print_quality_report(&mut self, report: &QualityReport) -> io::Result<()> {
        writeln!(
            self.out,
            "Columns found in {}: [{}]",
            report.table,
            report.columns.join(", ")
        )?;

        if !report.missing_values.is_empty() {
            writeln!(self.out, "Missing Values Detected:")?;
            for missing in &report.missing_values {
                writeln!(self.out, "  {}: {}", missing.column, missing.missing)?;
            }
        }

        if let Some(count) = report.duplicate_count().filter(|c| *c > 0) {
            writeln!(
                self.out,
                "Duplicate Records Found: {} (key: {})",
                count, report.duplicates.key_column
            )?;
        }

        if !report.type_violations.is_empty() {
            writeln!(self.out, "Invalid Data Types Found:")?;
            for violation in &report.type_violations {
                let observed: Vec<&str> = violation.observed.iter().map(|k| k.as_str()).collect();
                writeln!(
                    self.out,
                    "  {}: expected {}, found [{}]",
                    violation.column,
                    violation.expected,
                    observed.join(", ")
                )?;
            }
        }

        for finding in &report.range_findings {
            if let CheckOutcome::Checked(count) = finding.outcome
                && count > 0
            {
                writeln!(
                    self.out,
                    "Out-of-range Values in {}: {}{}",
                    finding.column,
                    count,
                    describe_bounds(finding.min, finding.max)
                )?;
            }
        }

        for finding in &report.categorical_findings {
            if let CheckOutcome::Checked(invalid) = &finding.outcome
                && !invalid.is_empty()
            {
                writeln!(
                    self.out,
                    "Invalid Values in {}: {}",
                    finding.column,
                    invalid.join(", ")
                )?;
            }
        }

        let skipped = report.skipped_checks();
        if !skipped.is_empty() {
            writeln!(self.out, "Skipped Checks:")?;
            for skip in skipped {
                writeln!(self.out, "  {}: {}", skip.check, skip.reason)?;
            }
        }

        Ok(())
    }
}

fn describe_bounds(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!(" (expected {} to {})", min, max),
        (Some(min), None) => format!(" (expected >= {})", min),
        (None, Some(max)) => format!(" (expected <= {})", max),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QualityError;
    use crate::pipeline::LoadSummary;
    use crate::types::{
        CategoricalFinding, DuplicateFinding, MissingValueCount, RangeFinding, ScalarKind,
        SkipReason, TypeViolation, ValueKind,
    };
    use std::path::PathBuf;

    fn render(f: impl FnOnce(&mut ReportPrinter<Vec<u8>>) -> io::Result<()>) -> String {
        let mut printer = ReportPrinter::new(Vec::new());
        f(&mut printer).unwrap();
        String::from_utf8(printer.into_inner()).unwrap()
    }

    fn clean_report() -> QualityReport {
        QualityReport {
            table: "brands".to_string(),
            row_count: 2,
            columns: vec!["barcode".to_string(), "name".to_string()],
            missing_values: vec![],
            duplicates: DuplicateFinding {
                key_column: "barcode".to_string(),
                outcome: CheckOutcome::Checked(0),
            },
            type_violations: vec![],
            skipped_type_checks: vec![],
            range_findings: vec![],
            categorical_findings: vec![],
        }
    }

    #[test]
    fn test_clean_report_prints_only_columns() {
        let output = render(|p| p.print_quality_report(&clean_report()));
        assert_eq!(output, "Columns found in brands: [barcode, name]\n");
    }

    #[test]
    fn test_findings_are_printed() {
        let mut report = clean_report();
        report.table = "receipts".to_string();
        report.missing_values = vec![MissingValueCount {
            column: "bonusPointsEarned".to_string(),
            missing: 575,
        }];
        report.duplicates.outcome = CheckOutcome::Checked(4);
        report.type_violations = vec![TypeViolation {
            column: "totalSpent".to_string(),
            expected: ScalarKind::Float,
            observed: [ValueKind::String].into_iter().collect(),
        }];
        report.range_findings = vec![RangeFinding {
            column: "totalSpent".to_string(),
            min: Some(0.0),
            max: None,
            outcome: CheckOutcome::Checked(1),
        }];
        report.categorical_findings = vec![CategoricalFinding {
            column: "rewardsReceiptStatus".to_string(),
            outcome: CheckOutcome::Checked(vec!["LOST".to_string()]),
        }];

        let output = render(|p| p.print_quality_report(&report));

        assert!(output.contains("Missing Values Detected:\n  bonusPointsEarned: 575\n"));
        assert!(output.contains("Duplicate Records Found: 4 (key: barcode)"));
        assert!(output.contains("  totalSpent: expected float, found [string]"));
        assert!(output.contains("Out-of-range Values in totalSpent: 1 (expected >= 0)"));
        assert!(output.contains("Invalid Values in rewardsReceiptStatus: LOST"));
        assert!(!output.contains("Skipped Checks"));
    }

    #[test]
    fn test_skipped_checks_are_listed() {
        let mut report = clean_report();
        report.duplicates.outcome = CheckOutcome::Skipped(SkipReason::ColumnMissing {
            column: "barcode".to_string(),
        });
        report.skipped_type_checks = vec![SkipReason::ColumnMissing {
            column: "topBrand".to_string(),
        }];

        let output = render(|p| p.print_quality_report(&report));

        assert!(!output.contains("Duplicate Records Found"));
        assert!(output.contains(
            "Skipped Checks:\n  duplicates: column 'barcode' not present\n  types: column 'topBrand' not present\n"
        ));
    }

    #[test]
    fn test_failed_table_shows_error_code() {
        let result = TableResult {
            table: "orders".to_string(),
            file: PathBuf::from("data/orders.json.gz"),
            load: LoadSummary::default(),
            status: TableStatus::Failed {
                error: QualityError::UnknownTable("orders".to_string()),
            },
        };

        let output = render(|p| p.print_table(&result));

        assert!(output.contains("--- Checking orders ---"));
        assert!(output.contains("ERROR [UNKNOWN_TABLE] Unknown table 'orders'"));
    }

    #[test]
    fn test_run_summary_counts() {
        let report = RunReport {
            generated_at: "2026-01-01T00:00:00+00:00".to_string(),
            data_dir: PathBuf::from("data"),
            tables: vec![
                TableResult {
                    table: "brands".to_string(),
                    file: PathBuf::from("data/brands.json.gz"),
                    load: LoadSummary::default(),
                    status: TableStatus::Checked {
                        report: clean_report(),
                    },
                },
                TableResult {
                    table: "users".to_string(),
                    file: PathBuf::from("data/users.json.gz"),
                    load: LoadSummary::default(),
                    status: TableStatus::Empty,
                },
            ],
        };

        let output = render(|p| p.print_run(&report));

        assert!(output.starts_with(&"=".repeat(80)));
        assert!(output.contains("Warning: No valid records found in data/users.json.gz"));
        assert!(output.contains("Tables checked: 1, empty: 1, failed: 0"));
    }

    #[test]
    fn test_print_samples() {
        let mut record = crate::types::Record::new();
        record.insert("user_id".to_string(), serde_json::json!("u1"));
        let samples = vec![
            SampleResult {
                table: "users".to_string(),
                file: PathBuf::from("data/users.json.gz"),
                record: Some(record),
                error: None,
            },
            SampleResult {
                table: "brands".to_string(),
                file: PathBuf::from("data/brands.json.gz"),
                record: None,
                error: None,
            },
        ];

        let output = render(|p| p.print_samples(&samples));

        assert!(output.contains("--- Reading from users.json.gz ---\n{\n  \"user_id\": \"u1\"\n}\n"));
        assert!(output.contains("No valid records found in brands.json.gz."));
    }

    #[test]
    fn test_print_json() {
        let mut printer = ReportPrinter::new(Vec::new());
        printer.print_json(&clean_report()).unwrap();
        let output = String::from_utf8(printer.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["duplicates"]["outcome"]["status"], "checked");
    }
}
