//! Per-batch normalization of configured date and boolean columns

pub mod boolean;

use tracing::trace;

use crate::config::TableDefinition;
use crate::model::RowBatch;
use crate::parser::dates::to_timestamp_cell;

pub use boolean::{normalize_raw_column, to_bool_column, ColumnKind};

/// Parse date columns and normalize boolean columns in place.
///
/// Configured columns missing from the batch header are skipped.
pub fn normalize_batch(batch: &mut RowBatch, table: &TableDefinition) {
    for col in &table.parse_dates {
        if let Some(idx) = batch.column_index(col) {
            batch.map_column(idx, to_timestamp_cell);
        } else {
            trace!(column = %col, "date column not in batch");
        }
    }

    for col in &table.boolean_cols {
        if let Some(idx) = batch.column_index(col) {
            let values = batch.column_values(idx);
            batch.replace_column(idx, normalize_raw_column(values));
        } else {
            trace!(column = %col, "boolean column not in batch");
        }
    }
}
