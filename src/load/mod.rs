//! Chunked loader: stream each source file into its destination table

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use crate::config::{Config, TableDefinition};
use crate::error::{LoadError, Result};
use crate::normalize::normalize_batch;
use crate::parser::CsvBatchReader;
use crate::sink::BatchSink;

/// Result of loading one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub table: String,
    pub rows: usize,
    pub batches: usize,
}

/// Result of a full run, one entry per table in load order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tables: Vec<LoadSummary>,
}

impl RunSummary {
    /// Rows appended across all tables
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// Stream `path` into `schema.table` in batches of `batch_size` rows.
///
/// Fails with [`LoadError::MissingFile`] before anything is read if the file
/// is absent. Each batch is normalized and appended before the next one is
/// read; the first failure ends the load, leaving earlier batches in place.
pub fn load_csv_to_table<S: BatchSink + ?Sized>(
    sink: &mut S,
    path: &Path,
    table: &TableDefinition,
    schema: &str,
    batch_size: usize,
) -> Result<LoadSummary> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    info!("Loading {} -> {}.{}", file_name, schema, table.table_name);

    let mut reader = CsvBatchReader::open(path, batch_size)?;
    check_header(reader.columns(), table, path)?;

    sink.prepare(table, schema)?;

    let mut summary = LoadSummary {
        table: table.table_name.clone(),
        ..Default::default()
    };
    while let Some(mut batch) = reader.next_batch()? {
        normalize_batch(&mut batch, table);
        sink.append(table, schema, &batch)?;

        summary.batches += 1;
        summary.rows += batch.row_count();
        debug!(
            table = %table.table_name,
            batch = summary.batches,
            rows = batch.row_count(),
            total = summary.rows,
            "appended batch"
        );
    }

    info!(
        table = %table.table_name,
        rows = summary.rows,
        batches = summary.batches,
        "loaded"
    );
    Ok(summary)
}

/// Every header column must be declared, and named only once
fn check_header(columns: &[String], table: &TableDefinition, path: &Path) -> Result<()> {
    if columns.is_empty() {
        return Err(LoadError::MissingHeader {
            path: path.to_path_buf(),
        });
    }

    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if !table.columns.contains_key(column.as_str()) {
            return Err(LoadError::SchemaMismatch {
                table: table.table_name.clone(),
                column: column.clone(),
                path: path.to_path_buf(),
            });
        }
        if !seen.insert(column.as_str()) {
            return Err(LoadError::DuplicateColumn {
                table: table.table_name.clone(),
                column: column.clone(),
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Runs every configured table, in order, against one sink
pub struct Loader {
    config: Config,
}

impl Loader {
    /// Create a loader; the config is validated here
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check the source directory and every table's file before loading
    pub fn check_sources(&self) -> Result<()> {
        let dir = &self.config.source_directory;
        if !dir.is_dir() {
            return Err(LoadError::MissingDirectory { path: dir.clone() });
        }
        for table in &self.config.table_definitions {
            let path = self.config.source_path(table);
            if !path.is_file() {
                return Err(LoadError::MissingFile { path });
            }
        }
        Ok(())
    }

    /// Load a single configured table
    pub fn load_table<S: BatchSink + ?Sized>(
        &self,
        sink: &mut S,
        table: &TableDefinition,
    ) -> Result<LoadSummary> {
        load_csv_to_table(
            sink,
            &self.config.source_path(table),
            table,
            &self.config.schema,
            self.config.batch_size,
        )
    }

    /// Load every table in order, stopping at the first failure
    pub fn run<S: BatchSink + ?Sized>(&self, sink: &mut S) -> Result<RunSummary> {
        self.check_sources()?;
        self.load_all(sink)
    }

    /// Like [`Loader::run`], but the sink is only built once every source
    /// has been found, so a missing file never opens a connection
    pub fn run_with<S, F>(&self, open_sink: F) -> Result<RunSummary>
    where
        S: BatchSink,
        F: FnOnce(&Config) -> Result<S>,
    {
        self.check_sources()?;
        let mut sink = open_sink(&self.config)?;
        self.load_all(&mut sink)
    }

    fn load_all<S: BatchSink + ?Sized>(&self, sink: &mut S) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for table in &self.config.table_definitions {
            summary.tables.push(self.load_table(sink, table)?);
        }

        info!("Done.");
        Ok(summary)
    }
}
