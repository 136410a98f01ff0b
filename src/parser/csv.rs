//! Streaming CSV reader producing fixed-size row batches

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{LoadError, Result};
use crate::model::{CellValue, Row, RowBatch};

/// Tokens that are always read as null, matched exactly without trimming
pub const NULL_TOKENS: &[&str] = &["", " ", "NA", "N/A", "null", "NULL"];

/// Conventional missing-value spellings that are also read as null
pub const DEFAULT_NULL_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "n/a", "nan", "NaN", "None",
];

/// Check whether a raw field is a null token
pub fn is_null_token(field: &str) -> bool {
    NULL_TOKENS.contains(&field) || DEFAULT_NULL_TOKENS.contains(&field)
}

/// Convert a raw field into a cell, mapping null tokens to `Null`
fn parse_cell_value(field: &str) -> CellValue {
    if is_null_token(field) {
        CellValue::Null
    } else {
        CellValue::Text(field.to_string())
    }
}

/// Reads a CSV file with a header row in batches of at most `batch_size` rows.
///
/// Every cell is delivered as `Text` or `Null`; typing happens later.
pub struct CsvBatchReader<R: Read> {
    reader: csv::Reader<R>,
    path: PathBuf,
    columns: Vec<String>,
    batch_size: usize,
    record: csv::StringRecord,
    rows_read: usize,
    finished: bool,
}

impl CsvBatchReader<BufReader<File>> {
    /// Open `path`, failing with [`LoadError::MissingFile`] before reading anything
    pub fn open(path: &Path, batch_size: usize) -> Result<Self> {
        if !path.is_file() {
            return Err(LoadError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file), path, batch_size)
    }
}

impl<R: Read> CsvBatchReader<R> {
    /// Wrap any reader; `path` is only used in error messages
    pub fn from_reader(reader: R, path: &Path, batch_size: usize) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let columns = reader
            .headers()
            .map_err(|source| LoadError::Csv {
                path: path.to_path_buf(),
                source,
            })?
            .iter()
            .map(str::to_string)
            .collect();

        Ok(Self {
            reader,
            path: path.to_path_buf(),
            columns,
            batch_size: batch_size.max(1),
            record: csv::StringRecord::new(),
            rows_read: 0,
            finished: false,
        })
    }

    /// Header column names in file order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows read so far
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Read the next batch; `Ok(None)` once the file is exhausted
    pub fn next_batch(&mut self) -> Result<Option<RowBatch>> {
        if self.finished {
            return Ok(None);
        }

        let mut batch = RowBatch::with_capacity(self.columns.clone(), self.batch_size);
        while batch.row_count() < self.batch_size {
            let more = match self.reader.read_record(&mut self.record) {
                Ok(more) => more,
                Err(source) => {
                    self.finished = true;
                    return Err(LoadError::Csv {
                        path: self.path.clone(),
                        source,
                    });
                }
            };
            if !more {
                self.finished = true;
                break;
            }

            self.rows_read += 1;
            // +1 for the header when the reader has no position
            let line = self
                .record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(self.rows_read + 1);
            let cells = self.record.iter().map(parse_cell_value).collect();
            batch.rows.push(Row::new(cells, line));
        }

        if batch.is_empty() {
            return Ok(None);
        }
        trace!(rows = batch.row_count(), total = self.rows_read, "read batch");
        Ok(Some(batch))
    }
}

impl<R: Read> Iterator for CsvBatchReader<R> {
    type Item = Result<RowBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_batch() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
