use crate::error::{Result, ResultExt};
use crate::schema::{CategoricalRule, RangeRule, TableSchema};
use crate::table::Table;
use crate::types::{
    CategoricalFinding, CheckOutcome, DuplicateFinding, MissingValueCount, QualityReport,
    RangeFinding, ScalarKind, SkipReason, TypeViolation, ValueKind,
};
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Runs the quality checks for one table.
///
/// Every check is a pure function of the table (or its frame) and the
/// schema; [`DatasetValidator::validate`] composes them into a report.
pub struct DatasetValidator;

impl DatasetValidator {
    /// Compute the quality report of `table` against `schema`.
    pub fn validate(table: &Table, schema: &TableSchema) -> Result<QualityReport> {
        let df = table
            .to_dataframe()
            .context(format!("Failed to build frame for {}", table.name()))?;

        let missing_values = Self::check_missing_values(&df);

        let duplicates = DuplicateFinding {
            key_column: schema.unique_key.clone(),
            outcome: Self::check_duplicates(table, &schema.unique_key)?,
        };

        let type_violations = Self::check_types(table, schema);
        let skipped_type_checks = Self::absent_declared_columns(table, schema);

        let range_findings = schema
            .range_rules
            .iter()
            .map(|rule| Self::check_range(&df, rule, schema.column_kind(&rule.column)))
            .collect::<Result<Vec<_>>>()?;

        let categorical_findings = schema
            .categorical_rules
            .iter()
            .map(|rule| Self::check_categorical(table, rule))
            .collect();

        debug!(
            "Validated {}: {} missing-value columns, {} type violations",
            table.name(),
            missing_values.len(),
            type_violations.len()
        );

        Ok(QualityReport {
            table: table.name().to_string(),
            row_count: table.height(),
            columns: table.column_names().to_vec(),
            missing_values,
            duplicates,
            type_violations,
            skipped_type_checks,
            range_findings,
            categorical_findings,
        })
    }

    /// Null counts per column, keeping only columns with at least one null.
    pub fn check_missing_values(df: &DataFrame) -> Vec<MissingValueCount> {
        df.get_columns()
            .iter()
            .filter_map(|col| {
                let missing = col.null_count();
                (missing > 0).then(|| MissingValueCount {
                    column: col.name().to_string(),
                    missing,
                })
            })
            .collect()
    }

    /// Rows whose `key` value occurs more than once, counting every occurrence.
    ///
    /// Keys are compared as JSON values, so `1` and `"1"` differ. Null keys
    /// compare equal to each other.
    pub fn check_duplicates(table: &Table, key: &str) -> Result<CheckOutcome<usize>> {
        if !table.has_column(key) {
            warn!("Column '{}' not found. Skipping duplicate check.", key);
            return Ok(CheckOutcome::Skipped(SkipReason::ColumnMissing {
                column: key.to_string(),
            }));
        }

        let keys = DataFrame::new(vec![table.identity_series(key).into_column()])?;
        let singletons = keys.unique::<&str, &str>(None, UniqueKeepStrategy::None, None)?;
        Ok(CheckOutcome::Checked(keys.height() - singletons.height()))
    }

    /// Schema columns whose non-null values include an incompatible kind.
    ///
    /// Columns absent from the table are not checked.
    pub fn check_types(table: &Table, schema: &TableSchema) -> Vec<TypeViolation> {
        schema
            .columns
            .iter()
            .filter(|spec| table.has_column(&spec.name))
            .filter_map(|spec| {
                let observed = table.observed_kinds(&spec.name);
                let violates = observed.iter().any(|kind| !kind.is_compatible_with(spec.kind));
                violates.then(|| TypeViolation {
                    column: spec.name.clone(),
                    expected: spec.kind,
                    observed,
                })
            })
            .collect()
    }

    /// Declared columns absent from the table, which the type check skips.
    pub fn absent_declared_columns(table: &Table, schema: &TableSchema) -> Vec<SkipReason> {
        schema
            .columns
            .iter()
            .filter(|spec| !table.has_column(&spec.name))
            .map(|spec| {
                debug!("Column '{}' not found. Skipping type check.", spec.name);
                SkipReason::ColumnMissing {
                    column: spec.name.clone(),
                }
            })
            .collect()
    }

    /// Rows outside the bounds of `rule`.
    ///
    /// Only evaluated when the column is declared numeric and holds numbers.
    pub fn check_range(
        df: &DataFrame,
        rule: &RangeRule,
        declared: Option<ScalarKind>,
    ) -> Result<RangeFinding> {
        let finding = |outcome| RangeFinding {
            column: rule.column.clone(),
            min: rule.min,
            max: rule.max,
            outcome,
        };

        if !declared.is_some_and(ScalarKind::is_numeric) {
            warn!(
                "Column '{}' is not declared numeric. Skipping range check.",
                rule.column
            );
            return Ok(finding(CheckOutcome::Skipped(
                SkipReason::NotNumericDeclared {
                    column: rule.column.clone(),
                    declared,
                },
            )));
        }

        let Ok(col) = df.column(&rule.column) else {
            warn!(
                "Column '{}' not found. Skipping range check.",
                rule.column
            );
            return Ok(finding(CheckOutcome::Skipped(SkipReason::ColumnMissing {
                column: rule.column.clone(),
            })));
        };

        let series = col.as_materialized_series();
        if series.null_count() == series.len() {
            return Ok(finding(CheckOutcome::Checked(0)));
        }
        if !is_numeric_dtype(series.dtype()) {
            warn!(
                "Column '{}' holds non-numeric values. Skipping range check.",
                rule.column
            );
            return Ok(finding(CheckOutcome::Skipped(
                SkipReason::NonNumericValues {
                    column: rule.column.clone(),
                    dtype: series.dtype().to_string(),
                },
            )));
        }

        let float_series = series.cast(&DataType::Float64)?;
        let out_of_range = float_series
            .f64()?
            .into_iter()
            .flatten()
            .filter(|value| rule.is_out_of_range(*value))
            .count();

        Ok(finding(CheckOutcome::Checked(out_of_range)))
    }

    /// Distinct non-null values of the column that are not allowed, sorted.
    ///
    /// Only strings can be allowed values. Any other value is invalid and
    /// is listed in JSON form with its kind, e.g. `true (boolean)`.
    pub fn check_categorical(table: &Table, rule: &CategoricalRule) -> CategoricalFinding {
        if !table.has_column(&rule.column) {
            warn!(
                "Column '{}' not found. Skipping categorical check.",
                rule.column
            );
            return CategoricalFinding {
                column: rule.column.clone(),
                outcome: CheckOutcome::Skipped(SkipReason::ColumnMissing {
                    column: rule.column.clone(),
                }),
            };
        }

        let invalid: BTreeSet<String> = table
            .values(&rule.column)
            .flatten()
            .filter_map(|value| match value {
                Value::String(s) if rule.allowed.contains(s) => None,
                Value::String(s) => Some(s.clone()),
                other => Some(format!("{} ({})", other, ValueKind::of(other))),
            })
            .collect();

        CategoricalFinding {
            column: rule.column.clone(),
            outcome: CheckOutcome::Checked(invalid.into_iter().collect()),
        }
    }
}
