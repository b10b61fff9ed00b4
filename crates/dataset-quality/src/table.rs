//! In-memory tabular view over loaded records.
//!
//! Records keep their original JSON values so the type check can see the
//! runtime kind of every value. The columnar checks run on a polars
//! [`DataFrame`] built from the same records by [`Table::to_dataframe`].

use crate::error::Result;
use crate::types::{Record, ValueKind};
use crate::utils::scalar_display;
use polars::prelude::*;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

/// Ordered records of one logical table.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    records: Vec<Record>,
    /// Union of record keys, in first-seen order.
    columns: Vec<String>,
}

impl Table {
    pub fn from_records(name: impl Into<String>, records: Vec<Record>) -> Self {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for record in &records {
            for key in record.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }

        Self {
            name: name.into(),
            records,
            columns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn height(&self) -> usize {
        self.records.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Rename a column in every record.
    ///
    /// Returns `false` without changing anything when `from` is absent or
    /// `to` already exists.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if !self.has_column(from) {
            return false;
        }
        if self.has_column(to) {
            warn!(
                "Not renaming '{}' to '{}' in {}: target column already exists",
                from, to, self.name
            );
            return false;
        }

        for record in &mut self.records {
            if let Some(value) = record.remove(from) {
                record.insert(to.to_string(), value);
            }
        }
        for column in &mut self.columns {
            if column == from {
                *column = to.to_string();
            }
        }
        debug!("Renamed column '{}' to '{}' in {}", from, to, self.name);
        true
    }

    /// Values of `column` per row; absent keys and JSON `null` are `None`.
    pub fn values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = Option<&'a Value>> + 'a {
        self.records
            .iter()
            .map(move |record| record.get(column).filter(|v| !v.is_null()))
    }

    /// Distinct kinds of the non-null values in `column`.
    pub fn observed_kinds(&self, column: &str) -> BTreeSet<ValueKind> {
        self.values(column).flatten().map(ValueKind::of).collect()
    }

    /// Build a polars frame with one column per table column.
    ///
    /// Column dtypes follow the observed values:
    /// - only booleans → `Boolean`
    /// - only integers that fit in `i64` → `Int64`, else in `u64` → `UInt64`
    /// - only numbers → `Float64`
    /// - anything else → `String`, with non-string values in JSON form
    ///
    /// Missing values become nulls.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|name| self.build_series(name).into_column())
            .collect::<Vec<_>>();
        Ok(DataFrame::new(columns)?)
    }

    fn build_series(&self, name: &str) -> Series {
        let kinds = self.observed_kinds(name);
        let values: Vec<Option<&Value>> = self.values(name).collect();

        if !kinds.is_empty() && kinds.iter().all(|k| *k == ValueKind::Boolean) {
            let data: Vec<Option<bool>> = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            return Series::new(name.into(), data);
        }

        if !kinds.is_empty() && kinds.iter().all(|k| k.is_numeric()) {
            let fits_i64 = values.iter().flatten().all(|v| v.as_i64().is_some());
            if fits_i64 {
                let data: Vec<Option<i64>> =
                    values.iter().map(|v| v.and_then(Value::as_i64)).collect();
                return Series::new(name.into(), data);
            }
            let fits_u64 = values.iter().flatten().all(|v| v.as_u64().is_some());
            if fits_u64 {
                let data: Vec<Option<u64>> =
                    values.iter().map(|v| v.and_then(Value::as_u64)).collect();
                return Series::new(name.into(), data);
            }
            let data: Vec<Option<f64>> = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
            return Series::new(name.into(), data);
        }

        let data: Vec<Option<String>> = values.iter().map(|v| v.map(scalar_display)).collect();
        Series::new(name.into(), data)
    }

    /// Values of `column` in compact JSON form, missing values as nulls.
    ///
    /// Two entries are equal only when the JSON values are, so `1`, `"1"`
    /// and `1.0` stay distinct and large integers keep every digit.
    pub fn identity_series(&self, column: &str) -> Series {
        let data: Vec<Option<String>> = self
            .values(column)
            .map(|v| v.map(Value::to_string))
            .collect();
        Series::new(column.into(), data)
    }
}
