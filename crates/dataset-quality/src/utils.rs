//! Shared utilities for loading and checking datasets.

use polars::prelude::*;
use serde_json::Value;
use std::path::Path;

/// File suffix of a dataset file; the stem before it is the table name.
pub const DATA_FILE_SUFFIX: &str = ".json.gz";

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// Value Formatting
// =============================================================================

/// Render a JSON value as a flat string.
///
/// Strings are returned without quotes; everything else uses its compact
/// JSON form, so `{"$oid": "x"}` stays distinguishable from `"x"`.
pub fn scalar_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Truncate a string to at most `max_chars` characters, appending `...`.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

// =============================================================================
// Path Utilities
// =============================================================================

/// Table name for a dataset file, e.g. `receipts` for `receipts.json.gz`.
///
/// Returns `None` for files that are not dataset files.
pub fn table_name_from_path(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.strip_suffix(DATA_FILE_SUFFIX)?;
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================
