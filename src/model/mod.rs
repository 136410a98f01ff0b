//! Data model for rows in flight and destination column types

mod schema;
mod table;

pub use schema::{type_map, SqlType, TypeMap};
pub use table::{CellValue, Row, RowBatch};
