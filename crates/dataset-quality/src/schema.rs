//! Table schemas: expected column types plus the rules checked per table.
//!
//! The built-in [`SchemaSet`] covers the `users`, `receipts` and `brands`
//! tables. A replacement set can be loaded from a JSON file:
//!
//! ```json
//! [
//!   {
//!     "name": "users",
//!     "unique_key": "user_id",
//!     "columns": [
//!       { "name": "user_id", "kind": "string" },
//!       { "name": "active", "kind": "boolean" }
//!     ],
//!     "categorical_rules": [
//!       { "column": "role", "allowed": ["consumer", "fetch-staff"] }
//!     ]
//!   }
//! ]
//! ```

use crate::error::{QualityError, Result, ResultExt};
use crate::types::ScalarKind;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use tracing::debug;

/// A declared column and its expected type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ScalarKind,
}

/// Column rename applied right after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    pub from: String,
    pub to: String,
}

/// Numeric bounds for a column. Either bound may be open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeRule {
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl RangeRule {
    /// Whether `value` lies outside the bounds.
    pub fn is_out_of_range(&self, value: f64) -> bool {
        self.min.is_some_and(|min| value < min) || self.max.is_some_and(|max| value > max)
    }
}

/// Allowed values for a categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalRule {
    pub column: String,
    pub allowed: BTreeSet<String>,
}

/// Expected shape of one logical table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    /// Column used for duplicate detection.
    pub unique_key: String,
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub renames: Vec<ColumnRename>,
    #[serde(default)]
    pub range_rules: Vec<RangeRule>,
    #[serde(default)]
    pub categorical_rules: Vec<CategoricalRule>,
}

impl TableSchema {
    /// Start building a schema for `name`, keyed on `unique_key`.
    pub fn builder(name: impl Into<String>, unique_key: impl Into<String>) -> TableSchemaBuilder {
        TableSchemaBuilder {
            name: name.into(),
            unique_key: unique_key.into(),
            columns: Vec::new(),
            renames: Vec::new(),
            range_rules: Vec::new(),
            categorical_rules: Vec::new(),
        }
    }

    /// Declared type of `column`, if declared.
    pub fn column_kind(&self, column: &str) -> Option<ScalarKind> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.kind)
    }

    /// Validate internal consistency.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| QualityError::InvalidSchema {
            table: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("table name is empty".to_string()));
        }
        if self.columns.is_empty() {
            return Err(invalid("no columns declared".to_string()));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(invalid(format!("column '{}' declared twice", column.name)));
            }
        }

        if !seen.contains(self.unique_key.as_str()) {
            return Err(invalid(format!(
                "unique key '{}' is not a declared column",
                self.unique_key
            )));
        }

        for rule in &self.range_rules {
            match (rule.min, rule.max) {
                (None, None) => {
                    return Err(invalid(format!(
                        "range rule on '{}' has no bounds",
                        rule.column
                    )));
                }
                (Some(min), Some(max)) if min > max => {
                    return Err(invalid(format!(
                        "range rule on '{}' has min {} above max {}",
                        rule.column, min, max
                    )));
                }
                _ => {}
            }
        }

        for rule in &self.categorical_rules {
            if rule.allowed.is_empty() {
                return Err(invalid(format!(
                    "categorical rule on '{}' allows no values",
                    rule.column
                )));
            }
        }

        Ok(())
    }
}

/// Builder for [`TableSchema`] with fluent API.
#[derive(Debug)]
pub struct TableSchemaBuilder {
    name: String,
    unique_key: String,
    columns: Vec<ColumnSpec>,
    renames: Vec<ColumnRename>,
    range_rules: Vec<RangeRule>,
    categorical_rules: Vec<CategoricalRule>,
}

impl TableSchemaBuilder {
    /// Declare a column and its expected type.
    pub fn column(mut self, name: impl Into<String>, kind: ScalarKind) -> Self {
        self.columns.push(ColumnSpec {
            name: name.into(),
            kind,
        });
        self
    }

    /// Rename `from` to `to` after loading.
    pub fn rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.push(ColumnRename {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Add numeric bounds for a column.
    pub fn range(mut self, column: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        self.range_rules.push(RangeRule {
            column: column.into(),
            min,
            max,
        });
        self
    }

    /// Restrict a column to a set of allowed values.
    pub fn categorical<I, S>(mut self, column: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_rules.push(CategoricalRule {
            column: column.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        });
        self
    }

    fn finish(self) -> TableSchema {
        TableSchema {
            name: self.name,
            unique_key: self.unique_key,
            columns: self.columns,
            renames: self.renames,
            range_rules: self.range_rules,
            categorical_rules: self.categorical_rules,
        }
    }

    /// Build and validate the schema.
    pub fn build(self) -> Result<TableSchema> {
        let schema = self.finish();
        schema.validate()?;
        Ok(schema)
    }
}

// ============================================================================
// Schema Set
// ============================================================================

static BUILTIN: Lazy<SchemaSet> = Lazy::new(|| SchemaSet {
    schemas: builtin_schemas()
        .into_iter()
        .map(|s| (s.name.clone(), s))
        .collect(),
});

fn builtin_schemas() -> Vec<TableSchema> {
    use ScalarKind::{Boolean, Float, Integer, String};

    let users = TableSchema::builder("users", "user_id")
        .column("user_id", String)
        .column("active", Boolean)
        .column("createdDate", String)
        .column("lastLogin", String)
        .column("role", String)
        .column("signUpSource", String)
        .column("state", String)
        .categorical("role", ["consumer", "fetch-staff"])
        .finish();

    let receipts = TableSchema::builder("receipts", "receipt_id")
        .rename("_id", "receipt_id")
        .column("receipt_id", String)
        .column("bonusPointsEarned", Integer)
        .column("bonusPointsEarnedReason", String)
        .column("createDate", String)
        .column("dateScanned", String)
        .column("finishedDate", String)
        .column("modifyDate", String)
        .column("pointsAwardedDate", String)
        .column("pointsEarned", Float)
        .column("purchaseDate", String)
        .column("purchasedItemCount", Integer)
        .column("rewardsReceiptStatus", String)
        .column("totalSpent", Float)
        .column("userId", String)
        .range("totalSpent", Some(0.0), None)
        .categorical(
            "rewardsReceiptStatus",
            ["ACCEPTED", "FINISHED", "FLAGGED", "PENDING", "REJECTED", "SUBMITTED"],
        )
        .finish();

    let brands = TableSchema::builder("brands", "barcode")
        .column("barcode", String)
        .column("brandCode", String)
        .column("category", String)
        .column("categoryCode", String)
        .column("cpg", String)
        .column("name", String)
        .column("topBrand", Boolean)
        .finish();

    vec![users, receipts, brands]
}

/// The schemas known to a run, keyed by table name.
#[derive(Debug, Clone)]
pub struct SchemaSet {
    schemas: BTreeMap<String, TableSchema>,
}

impl SchemaSet {
    /// Schemas for the `users`, `receipts` and `brands` tables.
    pub fn builtin() -> &'static SchemaSet {
        &BUILTIN
    }

    /// Build a set from schemas, validating each one.
    pub fn new(schemas: impl IntoIterator<Item = TableSchema>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for schema in schemas {
            schema.validate()?;
            let name = schema.name.clone();
            if map.insert(name.clone(), schema).is_some() {
                return Err(QualityError::InvalidSchema {
                    table: name,
                    reason: "table defined twice".to_string(),
                });
            }
        }
        Ok(Self { schemas: map })
    }

    /// Parse a JSON array of table schemas. The array must not be empty.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let schemas: Vec<TableSchema> = serde_json::from_str(json)?;
        let set = Self::new(schemas)?;
        if set.is_empty() {
            return Err(QualityError::InvalidConfig(
                "schema file defines no tables".to_string(),
            ));
        }
        Ok(set)
    }

    /// Load a JSON schema file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read schema file {}", path.display()))?;
        let set = Self::from_json_str(&content)
            .context(format!("Failed to parse schema file {}", path.display()))?;
        debug!("Loaded {} table schemas from {}", set.len(), path.display());
        Ok(set)
    }

    /// Schema for `table`, or [`QualityError::UnknownTable`].
    pub fn get(&self, table: &str) -> Result<&TableSchema> {
        self.schemas
            .get(table)
            .ok_or_else(|| QualityError::UnknownTable(table.to_string()))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
