//! Dataset file discovery.

use crate::error::{QualityError, Result, ResultExt};
use crate::utils::table_name_from_path;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A `<table>.json.gz` file found in the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataFile {
    pub table: String,
    pub path: PathBuf,
}

/// List the dataset files in `dir`, sorted by table name.
///
/// Fails with [`QualityError::DataDirNotFound`] when `dir` is not a
/// directory and [`QualityError::NoDataFiles`] when it holds no dataset file.
pub fn discover_data_files(dir: &Path) -> Result<Vec<DataFile>> {
    if !dir.is_dir() {
        return Err(QualityError::DataDirNotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    let entries =
        fs::read_dir(dir).context(format!("Failed to list data directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        match table_name_from_path(&path) {
            Some(table) => files.push(DataFile { table, path }),
            None => debug!("Ignoring non-dataset file {}", path.display()),
        }
    }

    if files.is_empty() {
        return Err(QualityError::NoDataFiles(dir.to_path_buf()));
    }

    files.sort_by(|a, b| a.table.cmp(&b.table));
    Ok(files)
}
