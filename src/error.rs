//! Error types for the loader

use std::path::PathBuf;

use thiserror::Error;

use crate::model::SqlType;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, LoadError>;

/// Every failure is fatal for the run; there is no recovery path.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The configured source directory does not exist
    #[error("Could not find data directory: {}", .path.display())]
    MissingDirectory { path: PathBuf },

    /// A table's source file does not exist
    #[error("Missing file: {}", .path.display())]
    MissingFile { path: PathBuf },

    /// The configuration could not be read or is inconsistent
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// I/O failure while opening or reading a source file
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV content (bad quoting, wrong field count, invalid UTF-8)
    #[error("Malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The file header names a column that is not in the type map
    #[error("Column '{column}' in {} is not declared for table {table}", .path.display())]
    SchemaMismatch {
        table: String,
        column: String,
        path: PathBuf,
    },

    /// The source file has no header row
    #[error("Missing header row in {}", .path.display())]
    MissingHeader { path: PathBuf },

    /// The file header names the same column more than once
    #[error("Column '{column}' appears more than once in {} for table {table}", .path.display())]
    DuplicateColumn {
        table: String,
        column: String,
        path: PathBuf,
    },

    /// A cell could not be converted into its declared storage type
    #[error("Cannot convert '{value}' in {table}.{column} (line {line}) to {target}")]
    Coercion {
        table: String,
        line: usize,
        column: String,
        value: String,
        target: SqlType,
    },

    /// Connection, DDL, or insert failure at the destination
    #[error("Destination error: {0}")]
    Destination(#[from] tokio_postgres::Error),

    /// The runtime driving the database client could not be started
    #[error("Failed to start database runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl LoadError {
    /// Build a configuration error from any message
    pub fn config(message: impl Into<String>) -> Self {
        LoadError::Config {
            message: message.into(),
        }
    }
}
