//! Record loading from gzip-compressed newline-delimited JSON files.
//!
//! Each line holds one JSON object. Lines that fail to parse are reported
//! as [`ParseFailure`] diagnostics and skipped; loading always continues
//! with the next line. Only failing to open the file is a hard error.

use crate::error::{Result, ResultExt};
use crate::types::{Record, ValueKind};
use crate::utils::truncate_chars;
use flate2::read::MultiGzDecoder;
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default number of characters of a bad line kept in its diagnostic.
pub const DEFAULT_SNIPPET_CHARS: usize = 100;

/// Why a line produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The line is not valid JSON.
    InvalidJson,
    /// The line is valid JSON but not an object.
    NotAnObject,
    /// The stream could not be read or decompressed; reading stopped here.
    Read,
}

/// Diagnostic for a line that produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseFailure {
    /// 1-based line number.
    pub line_number: usize,
    pub kind: FailureKind,
    pub message: String,
    /// Start of the offending line.
    pub snippet: String,
}

/// Outcome of reading a single line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Record(Record),
    Failure(ParseFailure),
}

/// Everything read from one file in "all valid records" mode.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub records: Vec<Record>,
    pub failures: Vec<ParseFailure>,
}

impl LoadOutcome {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Iterator over the lines of a newline-delimited JSON stream.
///
/// Owns the underlying handle; dropping the reader closes the file.
pub struct RecordReader<R> {
    reader: R,
    source: PathBuf,
    line_number: usize,
    buf: Vec<u8>,
    snippet_chars: usize,
    finished: bool,
}

impl RecordReader<BufReader<MultiGzDecoder<File>>> {
    /// Open a gzip-compressed dataset file.
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).context(format!("Failed to open dataset file {}", path.display()))?;
        Ok(Self::new(BufReader::new(MultiGzDecoder::new(file)), path))
    }
}

impl<R: BufRead> RecordReader<R> {
    /// Wrap an already-decompressed stream; `source` is used in diagnostics.
    pub fn new(reader: R, source: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            source: source.into(),
            line_number: 0,
            buf: Vec::new(),
            snippet_chars: DEFAULT_SNIPPET_CHARS,
            finished: false,
        }
    }

    pub fn with_snippet_chars(mut self, snippet_chars: usize) -> Self {
        self.snippet_chars = snippet_chars;
        self
    }

    fn parse_line(&self) -> LineOutcome {
        match serde_json::from_slice::<Value>(&self.buf) {
            Ok(Value::Object(record)) => LineOutcome::Record(record),
            Ok(other) => self.failure(
                FailureKind::NotAnObject,
                format!("expected a JSON object, found {}", ValueKind::of(&other)),
            ),
            Err(e) => self.failure(FailureKind::InvalidJson, e.to_string()),
        }
    }

    fn failure(&self, kind: FailureKind, message: String) -> LineOutcome {
        let line = String::from_utf8_lossy(&self.buf);
        let snippet = truncate_chars(line.trim_end(), self.snippet_chars);
        warn!(
            "Skipping line {} in {}: {} ({})",
            self.line_number,
            self.source.display(),
            message,
            snippet
        );
        LineOutcome::Failure(ParseFailure {
            line_number: self.line_number,
            kind,
            message,
            snippet,
        })
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = LineOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.finished = true,
                Ok(_) => {
                    self.line_number += 1;
                    if self.buf.iter().all(u8::is_ascii_whitespace) {
                        continue;
                    }
                    return Some(self.parse_line());
                }
                Err(e) => {
                    // A broken stream cannot be resynchronised
                    self.finished = true;
                    self.line_number += 1;
                    return Some(self.failure(FailureKind::Read, e.to_string()));
                }
            }
        }
        None
    }
}

/// Loads records from dataset files in either access mode.
#[derive(Debug, Clone, Copy)]
pub struct RecordLoader {
    snippet_chars: usize,
}

impl Default for RecordLoader {
    fn default() -> Self {
        Self {
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }
}

impl RecordLoader {
    pub fn new(snippet_chars: usize) -> Self {
        Self { snippet_chars }
    }

    fn open(&self, path: &Path) -> Result<RecordReader<BufReader<MultiGzDecoder<File>>>> {
        Ok(RecordReader::open(path)?.with_snippet_chars(self.snippet_chars))
    }

    /// First valid record of the file, or `None` if no line parses.
    pub fn first_record(&self, path: &Path) -> Result<Option<Record>> {
        let record = self.open(path)?.find_map(|outcome| match outcome {
            LineOutcome::Record(record) => Some(record),
            LineOutcome::Failure(_) => None,
        });
        Ok(record)
    }

    /// Every valid record of the file plus a diagnostic per skipped line.
    pub fn load_records(&self, path: &Path) -> Result<LoadOutcome> {
        let mut outcome = LoadOutcome::default();
        for line in self.open(path)? {
            match line {
                LineOutcome::Record(record) => outcome.records.push(record),
                LineOutcome::Failure(failure) => outcome.failures.push(failure),
            }
        }
        debug!(
            "Loaded {} records ({} skipped lines) from {}",
            outcome.records.len(),
            outcome.failures.len(),
            path.display()
        );
        Ok(outcome)
    }
}
