//! In-memory destination for dry runs and tests

use tracing::debug;

use crate::config::TableDefinition;
use crate::error::Result;
use crate::model::RowBatch;

use super::{insert_columns, typed_rows, BatchSink, PgValue};

/// One recorded `append` call
#[derive(Debug, Clone, PartialEq)]
pub struct AppendRecord {
    pub schema: String,
    pub table: String,
    /// Inserted columns, in insert order
    pub columns: Vec<String>,
    pub row_count: usize,
    /// Typed rows, empty unless the sink keeps rows
    pub rows: Vec<Vec<PgValue>>,
}

/// Records appends instead of writing them anywhere.
///
/// Values are still coerced into their declared types, so a dry run fails on
/// the same data a real load would.
#[derive(Debug, Default)]
pub struct MemorySink {
    keep_rows: bool,
    /// Tables passed to `prepare`, in call order
    pub prepared: Vec<String>,
    /// Every append, in call order
    pub appends: Vec<AppendRecord>,
}

impl MemorySink {
    /// A sink that keeps every typed row
    pub fn new() -> Self {
        Self {
            keep_rows: true,
            ..Default::default()
        }
    }

    /// A sink that only records counts and column order
    pub fn counting() -> Self {
        Self::default()
    }

    /// Total rows appended across all tables
    pub fn total_rows(&self) -> usize {
        self.appends.iter().map(|a| a.row_count).sum()
    }
}

impl BatchSink for MemorySink {
    fn prepare(&mut self, table: &TableDefinition, schema: &str) -> Result<()> {
        self.prepared
            .push(format!("{}.{}", schema, table.table_name));
        Ok(())
    }

    fn append(&mut self, table: &TableDefinition, schema: &str, batch: &RowBatch) -> Result<()> {
        let columns = insert_columns(table, batch);
        let rows = typed_rows(table, &columns, batch)?;
        debug!(table = %table.table_name, rows = rows.len(), "recorded batch");

        self.appends.push(AppendRecord {
            schema: schema.to_string(),
            table: table.table_name.clone(),
            columns: columns.iter().map(|c| c.name.to_string()).collect(),
            row_count: rows.len(),
            rows: if self.keep_rows { rows } else { Vec::new() },
        });
        Ok(())
    }
}
