//! Source file reading: CSV batches and date parsing

mod csv;
pub mod dates;

pub use self::csv::{is_null_token, CsvBatchReader, DEFAULT_NULL_TOKENS, NULL_TOKENS};
pub use self::dates::parse_timestamp;
