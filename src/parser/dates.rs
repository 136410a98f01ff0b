//! Lenient timestamp parsing for date columns

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::model::CellValue;

/// Datetime layouts tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
];

/// Date-only layouts; the time part becomes midnight
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Parse a timestamp, returning `None` when no known layout matches.
///
/// Offsets (RFC 3339) are normalized to UTC and dropped, since the
/// destination column is a `TIMESTAMP` without time zone.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Convert one cell of a date column; unparseable text becomes null
pub fn to_timestamp_cell(cell: CellValue) -> CellValue {
    match cell {
        CellValue::Text(s) => parse_timestamp(&s).into(),
        ts @ CellValue::Timestamp(_) => ts,
        _ => CellValue::Null,
    }
}
