//! Destinations that receive normalized row batches

mod memory;
mod postgres;
mod value;

use crate::config::TableDefinition;
use crate::error::{LoadError, Result};
use crate::model::{RowBatch, SqlType};

pub use memory::{AppendRecord, MemorySink};
pub use postgres::{create_table_sql, insert_sql, quote_ident, PostgresSink, MAX_BIND_PARAMS};
pub use value::{coerce_cell, PgValue};

/// Trait for batch destinations
pub trait BatchSink {
    /// Called once per table before its first batch
    fn prepare(&mut self, table: &TableDefinition, schema: &str) -> Result<()>;

    /// Append one batch; each call is a persisted write
    fn append(&mut self, table: &TableDefinition, schema: &str, batch: &RowBatch) -> Result<()>;
}

/// A destination column and where its values sit in the batch
#[derive(Debug, Clone, PartialEq)]
pub struct InsertColumn<'a> {
    pub name: &'a str,
    pub sql_type: SqlType,
    /// Index into the batch header
    pub batch_index: usize,
}

/// Columns to insert: declared columns present in the batch, in type map order
pub fn insert_columns<'a>(table: &'a TableDefinition, batch: &RowBatch) -> Vec<InsertColumn<'a>> {
    table
        .columns
        .iter()
        .filter_map(|(name, ty)| {
            batch.column_index(name).map(|batch_index| InsertColumn {
                name: name.as_str(),
                sql_type: *ty,
                batch_index,
            })
        })
        .collect()
}

/// Convert every row of `batch` into typed values ordered like `columns`
pub fn typed_rows(
    table: &TableDefinition,
    columns: &[InsertColumn<'_>],
    batch: &RowBatch,
) -> Result<Vec<Vec<PgValue>>> {
    batch
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| {
                    let cell = row.get(col.batch_index).ok_or_else(|| LoadError::Coercion {
                        table: table.table_name.clone(),
                        line: row.source_line,
                        column: col.name.to_string(),
                        value: String::new(),
                        target: col.sql_type,
                    })?;
                    coerce_cell(cell, col.sql_type).ok_or_else(|| LoadError::Coercion {
                        table: table.table_name.clone(),
                        line: row.source_line,
                        column: col.name.to_string(),
                        value: cell.display().into_owned(),
                        target: col.sql_type,
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}
