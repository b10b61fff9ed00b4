use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// A loaded row: one JSON object from a dataset file.
pub type Record = serde_json::Map<String, Value>;

// ============================================================================
// Type Kinds
// ============================================================================

/// Expected scalar type of a schema column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Boolean,
    Integer,
    Float,
}

impl ScalarKind {
    /// Integer and float columns can carry range rules.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime kind of an observed JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    String,
    Boolean,
    Integer,
    Float,
    Object,
    Array,
}

impl ValueKind {
    /// Classify a JSON value.
    ///
    /// Numbers without a fractional representation (`i64`/`u64`) are
    /// integers; everything else numeric is a float, so `5.0` is a float.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Float,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Whether a value of this kind satisfies the expected scalar kind.
    ///
    /// | observed  | string | boolean | integer | float |
    /// |-----------|--------|---------|---------|-------|
    /// | string    | yes    |         |         |       |
    /// | boolean   |        | yes     |         |       |
    /// | integer   |        |         | yes     | yes   |
    /// | float     |        |         |         | yes   |
    ///
    /// Nulls are never type-checked; objects and arrays satisfy nothing.
    pub fn is_compatible_with(self, expected: ScalarKind) -> bool {
        matches!(
            (self, expected),
            (Self::String, ScalarKind::String)
                | (Self::Boolean, ScalarKind::Boolean)
                | (Self::Integer, ScalarKind::Integer)
                | (Self::Integer, ScalarKind::Float)
                | (Self::Float, ScalarKind::Float)
        )
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Check Outcomes
// ============================================================================

/// Why a check could not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The column is absent from the loaded table.
    ColumnMissing { column: String },
    /// A range rule targets a column whose declared type is not numeric.
    NotNumericDeclared { column: String, declared: Option<ScalarKind> },
    /// The column holds values that are not numbers.
    NonNumericValues { column: String, dtype: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColumnMissing { column } => write!(f, "column '{}' not present", column),
            Self::NotNumericDeclared {
                column,
                declared: Some(kind),
            } => write!(f, "column '{}' is declared {}, not numeric", column, kind),
            Self::NotNumericDeclared {
                column,
                declared: None,
            } => write!(f, "column '{}' is not declared in the schema", column),
            Self::NonNumericValues { column, dtype } => {
                write!(f, "column '{}' holds non-numeric values ({})", column, dtype)
            }
        }
    }
}

/// Result of a single check: either it ran, or it was skipped for a reason.
///
/// Keeps "checked, found nothing" distinct from "could not check".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum CheckOutcome<T> {
    Checked(T),
    Skipped(SkipReason),
}

impl<T> CheckOutcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    pub fn checked(&self) -> Option<&T> {
        match self {
            Self::Checked(value) => Some(value),
            Self::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Self::Checked(_) => None,
            Self::Skipped(reason) => Some(reason),
        }
    }
}

// ============================================================================
// Findings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingValueCount {
    pub column: String,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateFinding {
    pub key_column: String,
    /// Rows whose key occurs more than once, counting every occurrence.
    pub outcome: CheckOutcome<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeViolation {
    pub column: String,
    pub expected: ScalarKind,
    pub observed: BTreeSet<ValueKind>,
}

impl TypeViolation {
    /// Observed kinds that do not satisfy the expected kind.
    pub fn offending(&self) -> impl Iterator<Item = ValueKind> + '_ {
        self.observed
            .iter()
            .copied()
            .filter(|kind| !kind.is_compatible_with(self.expected))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeFinding {
    pub column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Rows outside `[min, max]`.
    pub outcome: CheckOutcome<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalFinding {
    pub column: String,
    /// Distinct values not in the allowed set, sorted.
    pub outcome: CheckOutcome<Vec<String>>,
}

/// A check that did not run, with the check it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCheck<'a> {
    pub check: &'static str,
    pub reason: &'a SkipReason,
}

// ============================================================================
// Quality Report
// ============================================================================

/// Structured findings from running every check on one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub table: String,
    pub row_count: usize,
    /// Columns present after renames, in first-seen order.
    pub columns: Vec<String>,
    /// Only columns with at least one missing value.
    pub missing_values: Vec<MissingValueCount>,
    pub duplicates: DuplicateFinding,
    pub type_violations: Vec<TypeViolation>,
    /// Declared columns the type check could not look at.
    pub skipped_type_checks: Vec<SkipReason>,
    pub range_findings: Vec<RangeFinding>,
    pub categorical_findings: Vec<CategoricalFinding>,
}

impl QualityReport {
    /// Duplicate rows, or `None` when the check was skipped.
    pub fn duplicate_count(&self) -> Option<usize> {
        self.duplicates.outcome.checked().copied()
    }

    pub fn missing_for(&self, column: &str) -> Option<usize> {
        self.missing_values
            .iter()
            .find(|m| m.column == column)
            .map(|m| m.missing)
    }

    pub fn type_violation(&self, column: &str) -> Option<&TypeViolation> {
        self.type_violations.iter().find(|v| v.column == column)
    }

    pub fn range_finding(&self, column: &str) -> Option<&RangeFinding> {
        self.range_findings.iter().find(|r| r.column == column)
    }

    pub fn categorical_finding(&self, column: &str) -> Option<&CategoricalFinding> {
        self.categorical_findings.iter().find(|c| c.column == column)
    }

    /// Every check that was skipped, in report order.
    pub fn skipped_checks(&self) -> Vec<SkippedCheck<'_>> {
        let mut skipped = Vec::new();
        if let Some(reason) = self.duplicates.outcome.skip_reason() {
            skipped.push(SkippedCheck {
                check: "duplicates",
                reason,
            });
        }
        for reason in &self.skipped_type_checks {
            skipped.push(SkippedCheck {
                check: "types",
                reason,
            });
        }
        for finding in &self.range_findings {
            if let Some(reason) = finding.outcome.skip_reason() {
                skipped.push(SkippedCheck {
                    check: "range",
                    reason,
                });
            }
        }
        for finding in &self.categorical_findings {
            if let Some(reason) = finding.outcome.skip_reason() {
                skipped.push(SkippedCheck {
                    check: "categorical",
                    reason,
                });
            }
        }
        skipped
    }

    /// True when no problem was found and the key and rule checks all ran.
    ///
    /// Declared columns absent from the table do not make it unclean.
    pub fn is_clean(&self) -> bool {
        self.missing_values.is_empty()
            && self.duplicate_count() == Some(0)
            && self.type_violations.is_empty()
            && self
                .range_findings
                .iter()
                .all(|r| r.outcome == CheckOutcome::Checked(0))
            && self
                .categorical_findings
                .iter()
                .all(|c| c.outcome.checked().is_some_and(|v| v.is_empty()))
    }
}
