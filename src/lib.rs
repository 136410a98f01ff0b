//! csv-ingest - chunked CSV loading into PostgreSQL
//!
//! Streams CSV files into relational tables in fixed-size batches, parsing
//! configured date columns and normalizing boolean columns on the way.

pub mod config;
pub mod error;
pub mod load;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod sink;

pub use config::{Config, ConnectionConfig, TableDefinition};
pub use error::{LoadError, Result};
pub use load::{load_csv_to_table, LoadSummary, Loader, RunSummary};
pub use sink::{BatchSink, MemorySink, PostgresSink};
