//! Integration tests for the dataset quality checker.
//!
//! These tests write gzip-compressed JSON line files into temporary data
//! directories and run sampling and checking end to end.

use dataset_quality::loader::FailureKind;
use dataset_quality::{
    CheckOutcome, DatasetValidator, QualityConfig, QualityError, QualityRunner, RecordLoader,
    ReportPrinter, SchemaSet, SkipReason, Table, TableStatus, ValueKind,
};
use flate2::Compression;
use flate2::write::GzEncoder;
use pretty_assertions::assert_eq;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn write_gz(dir: &Path, table: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(format!("{}.json.gz", table));
    let file = File::create(&path).expect("Failed to create fixture");
    let mut encoder = GzEncoder::new(file, Compression::default());
    for line in lines {
        writeln!(encoder, "{}", line).expect("Failed to write fixture line");
    }
    encoder.finish().expect("Failed to finish gzip stream");
    path
}

fn data_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn runner_for(dir: &Path) -> QualityRunner {
    let config = QualityConfig::builder()
        .data_dir(dir)
        .build()
        .expect("Failed to build config");
    QualityRunner::new(config).expect("Failed to create runner")
}

fn check_single(dir: &Path, table: &str) -> dataset_quality::QualityReport {
    let report = runner_for(dir).check().expect("Check run failed");
    let result = report.table(table).expect("Table missing from run report");
    match &result.status {
        TableStatus::Checked { report } => report.clone(),
        other => panic!("Expected {} to be checked, got {:?}", table, other),
    }
}

// ============================================================================
// Record Loader
// ============================================================================

#[test]
fn test_malformed_line_is_reported_not_fatal() {
    let dir = data_dir();
    let path = write_gz(dir.path(), "sample", &[r#"{"a":1}"#, "{bad json}", r#"{"a":2}"#]);

    let outcome = RecordLoader::default().load_records(&path).unwrap();

    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.records[0]["a"], 1);
    assert_eq!(outcome.records[1]["a"], 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].line_number, 2);
    assert_eq!(outcome.failures[0].kind, FailureKind::InvalidJson);
}

#[test]
fn test_first_record_skips_leading_garbage() {
    let dir = data_dir();
    let path = write_gz(dir.path(), "users", &["not json", r#"{"user_id": "u7"}"#]);

    let record = RecordLoader::default().first_record(&path).unwrap();

    assert_eq!(record.unwrap()["user_id"], "u7");
}

// ============================================================================
// Checks against the built-in schemas
// ============================================================================

#[test]
fn test_users_string_boolean_is_type_violation() {
    let dir = data_dir();
    write_gz(
        dir.path(),
        "users",
        &[
            r#"{"user_id": "u1", "active": true, "role": "consumer"}"#,
            r#"{"user_id": "u2", "active": "true", "role": "consumer"}"#,
        ],
    );

    let report = check_single(dir.path(), "users");

    let violation = report.type_violation("active").expect("active should be flagged");
    assert!(violation.observed.contains(&ValueKind::String));
    assert_eq!(violation.offending().collect::<Vec<_>>(), vec![ValueKind::String]);
    assert!(report.type_violation("user_id").is_none());
}

#[test]
fn test_receipts_negative_total_is_out_of_range() {
    let dir = data_dir();
    write_gz(
        dir.path(),
        "receipts",
        &[
            r#"{"_id": "r1", "totalSpent": -5.0}"#,
            r#"{"_id": "r2", "totalSpent": 10.0}"#,
        ],
    );

    let report = check_single(dir.path(), "receipts");

    let finding = report.range_finding("totalSpent").unwrap();
    assert_eq!(finding.outcome, CheckOutcome::Checked(1));
}

#[test]
fn test_duplicate_pairs_give_even_count() {
    let dir = data_dir();
    write_gz(
        dir.path(),
        "brands",
        &[
            r#"{"barcode": "111", "name": "A"}"#,
            r#"{"barcode": "111", "name": "A2"}"#,
            r#"{"barcode": "222", "name": "B"}"#,
            r#"{"barcode": "222", "name": "B2"}"#,
            r#"{"barcode": "333", "name": "C"}"#,
        ],
    );

    let report = check_single(dir.path(), "brands");

    let duplicates = report.duplicate_count().unwrap();
    assert_eq!(duplicates, 4);
    assert_eq!(duplicates % 2, 0);
}

#[test]
fn test_absent_columns_are_skipped_everywhere() {
    let dir = data_dir();
    write_gz(
        dir.path(),
        "receipts",
        &[r#"{"userId": "u1"}"#, r#"{"userId": "u2"}"#],
    );

    let report = check_single(dir.path(), "receipts");

    assert_eq!(
        report.duplicates.outcome,
        CheckOutcome::Skipped(SkipReason::ColumnMissing {
            column: "receipt_id".to_string()
        })
    );
    assert!(report.range_finding("totalSpent").unwrap().outcome.is_skipped());
    assert!(
        report
            .categorical_finding("rewardsReceiptStatus")
            .unwrap()
            .outcome
            .is_skipped()
    );
    assert!(report.type_violations.is_empty());

    let skipped = report.skipped_checks();
    let rule_checks: Vec<&str> = skipped
        .iter()
        .filter(|s| s.check != "types")
        .map(|s| s.check)
        .collect();
    assert_eq!(rule_checks, vec!["duplicates", "range", "categorical"]);
    // Every declared column except userId is absent
    assert_eq!(report.skipped_type_checks.len(), 13);
    assert!(report.skipped_type_checks.contains(&SkipReason::ColumnMissing {
        column: "totalSpent".to_string()
    }));
}

#[test]
fn test_columns_keep_first_seen_order() {
    let dir = data_dir();
    write_gz(
        dir.path(),
        "users",
        &[
            r#"{"user_id": "u1", "state": "WI", "active": true}"#,
            r#"{"user_id": "u2", "role": "consumer", "active": false}"#,
        ],
    );

    let report = check_single(dir.path(), "users");

    assert_eq!(report.columns, vec!["user_id", "state", "active", "role"]);
    let missing: Vec<&str> = report
        .missing_values
        .iter()
        .map(|m| m.column.as_str())
        .collect();
    assert_eq!(missing, vec!["state", "role"]);
}

#[test]
fn test_mixed_kind_keys_are_not_duplicates() {
    let dir = data_dir();
    write_gz(
        dir.path(),
        "brands",
        &[r#"{"barcode": 511111019862}"#, r#"{"barcode": "511111019862"}"#],
    );

    let report = check_single(dir.path(), "brands");

    assert_eq!(report.duplicate_count(), Some(0));
    assert!(report.type_violation("barcode").is_some());
}

#[test]
fn test_complete_table_has_no_missing_values() {
    let dir = data_dir();
    write_gz(
        dir.path(),
        "brands",
        &[
            r#"{"barcode": "1", "name": "A", "topBrand": true}"#,
            r#"{"barcode": "2", "name": "B", "topBrand": false}"#,
        ],
    );

    let report = check_single(dir.path(), "brands");

    assert!(report.missing_values.is_empty());
    assert!(report.is_clean());
}

#[test]
fn test_absent_keys_count_as_missing() {
    let dir = data_dir();
    write_gz(
        dir.path(),
        "brands",
        &[
            r#"{"barcode": "1", "category": "Baking"}"#,
            r#"{"barcode": "2"}"#,
            r#"{"barcode": "3", "category": null}"#,
        ],
    );

    let report = check_single(dir.path(), "brands");

    assert_eq!(report.missing_for("category"), Some(2));
    assert_eq!(report.missing_for("barcode"), None);
}

#[test]
fn test_integer_accepted_as_float_but_boolean_not_integer() {
    let dir = data_dir();
    write_gz(
        dir.path(),
        "receipts",
        &[
            r#"{"_id": "r1", "pointsEarned": 5, "purchasedItemCount": 2}"#,
            r#"{"_id": "r2", "pointsEarned": 7.5, "purchasedItemCount": true}"#,
        ],
    );

    let report = check_single(dir.path(), "receipts");

    assert!(report.type_violation("pointsEarned").is_none());
    let violation = report.type_violation("purchasedItemCount").unwrap();
    assert_eq!(
        violation.offending().collect::<Vec<_>>(),
        vec![ValueKind::Boolean]
    );
}

#[test]
fn test_invalid_categorical_values_are_listed() {
    let dir = data_dir();
    write_gz(
        dir.path(),
        "receipts",
        &[
            r#"{"_id": "r1", "rewardsReceiptStatus": "FINISHED"}"#,
            r#"{"_id": "r2", "rewardsReceiptStatus": "LOST"}"#,
            r#"{"_id": "r3", "rewardsReceiptStatus": "LOST"}"#,
            r#"{"_id": "r4", "rewardsReceiptStatus": "DELETED"}"#,
        ],
    );

    let report = check_single(dir.path(), "receipts");

    assert_eq!(
        report
            .categorical_finding("rewardsReceiptStatus")
            .unwrap()
            .outcome,
        CheckOutcome::Checked(vec!["DELETED".to_string(), "LOST".to_string()])
    );
}

// ============================================================================
// Run behaviour
// ============================================================================

#[test]
fn test_unknown_table_is_diagnosed_and_others_checked() {
    let dir = data_dir();
    write_gz(dir.path(), "orders", &[r#"{"order_id": 1}"#]);
    write_gz(dir.path(), "users", &[r#"{"user_id": "u1", "active": true}"#]);

    let report = runner_for(dir.path()).check().unwrap();

    let orders = report.table("orders").unwrap();
    let error = orders.error().expect("orders should fail");
    assert_eq!(error.error_code(), "UNKNOWN_TABLE");
    assert!(error.to_string().contains("orders"));
    assert!(report.table("users").unwrap().report().is_some());
    assert_eq!(report.failed_tables().count(), 1);
}

#[test]
fn test_missing_data_dir() {
    let dir = data_dir();
    let missing = dir.path().join("does-not-exist");

    let result = runner_for(&missing).check();

    assert!(matches!(result, Err(QualityError::DataDirNotFound(_))));
}

#[test]
fn test_directory_without_data_files() {
    let dir = data_dir();
    std::fs::write(dir.path().join("notes.txt"), "nothing here").unwrap();

    let result = runner_for(dir.path()).sample();

    assert!(matches!(result, Err(QualityError::NoDataFiles(_))));
}

#[test]
fn test_tables_are_processed_in_name_order() {
    let dir = data_dir();
    write_gz(dir.path(), "users", &[r#"{"user_id": "u1"}"#]);
    write_gz(dir.path(), "brands", &[r#"{"barcode": "b1"}"#]);
    write_gz(dir.path(), "receipts", &[r#"{"_id": "r1"}"#]);

    let report = runner_for(dir.path()).check().unwrap();

    let names: Vec<&str> = report.tables.iter().map(|t| t.table.as_str()).collect();
    assert_eq!(names, vec!["brands", "receipts", "users"]);
}

#[test]
fn test_schema_file_replaces_builtins() {
    let dir = data_dir();
    write_gz(
        dir.path(),
        "orders",
        &[r#"{"order_id": 1, "qty": 3}"#, r#"{"order_id": 2, "qty": -1}"#],
    );
    let schema_path = dir.path().join("schemas.json");
    std::fs::write(
        &schema_path,
        r#"[{
            "name": "orders",
            "unique_key": "order_id",
            "columns": [
                {"name": "order_id", "kind": "integer"},
                {"name": "qty", "kind": "integer"}
            ],
            "range_rules": [{"column": "qty", "min": 0}]
        }]"#,
    )
    .unwrap();

    let config = QualityConfig::builder()
        .data_dir(dir.path())
        .schema_file(&schema_path)
        .build()
        .unwrap();
    let report = QualityRunner::new(config).unwrap().check().unwrap();

    let orders = report.table("orders").unwrap().report().unwrap();
    assert_eq!(orders.duplicate_count(), Some(0));
    assert_eq!(
        orders.range_finding("qty").unwrap().outcome,
        CheckOutcome::Checked(1)
    );
}

#[test]
fn test_parse_failures_are_carried_into_the_run_report() {
    let dir = data_dir();
    write_gz(
        dir.path(),
        "users",
        &[r#"{"user_id": "u1"}"#, "[1, 2]", "{oops"],
    );

    let report = runner_for(dir.path()).check().unwrap();
    let users = report.table("users").unwrap();

    assert_eq!(users.load.records, 1);
    let kinds: Vec<FailureKind> = users.load.failures.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![FailureKind::NotAnObject, FailureKind::InvalidJson]);
}

// ============================================================================
// Library building blocks and output
// ============================================================================

#[test]
fn test_validate_without_runner() {
    let dir = data_dir();
    let path = write_gz(
        dir.path(),
        "users",
        &[
            r#"{"user_id": "u1", "role": "consumer"}"#,
            r#"{"user_id": "u2", "role": "admin"}"#,
        ],
    );

    let outcome = RecordLoader::default().load_records(&path).unwrap();
    let table = Table::from_records("users", outcome.records);
    let schema = SchemaSet::builtin().get("users").unwrap();
    let report = DatasetValidator::validate(&table, schema).unwrap();

    assert_eq!(report.row_count, 2);
    assert_eq!(
        report.categorical_finding("role").unwrap().outcome,
        CheckOutcome::Checked(vec!["admin".to_string()])
    );
}

#[test]
fn test_text_and_json_reports() {
    let dir = data_dir();
    write_gz(
        dir.path(),
        "receipts",
        &[
            r#"{"_id": "r1", "totalSpent": -1.0}"#,
            r#"{"_id": "r1", "totalSpent": 3.0}"#,
        ],
    );
    let report = runner_for(dir.path()).check().unwrap();

    let mut printer = ReportPrinter::new(Vec::new());
    printer.print_run(&report).unwrap();
    let text = String::from_utf8(printer.into_inner()).unwrap();
    assert!(text.contains("--- Checking receipts ---"));
    assert!(text.contains("Duplicate Records Found: 2 (key: receipt_id)"));
    assert!(text.contains("Out-of-range Values in totalSpent: 1"));

    let mut printer = ReportPrinter::new(Vec::new());
    printer.print_json(&report).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&printer.into_inner()).unwrap();
    assert_eq!(json["tables"][0]["table"], "receipts");
    assert_eq!(json["tables"][0]["status"]["status"], "checked");
}
