//! Data quality validation module.
//!
//! This module checks a loaded table against its schema for missing
//! values, duplicate keys, type mismatches, out-of-range numbers and
//! invalid categorical values.

mod validator;

pub use validator::DatasetValidator;
