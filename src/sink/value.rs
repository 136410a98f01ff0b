//! Typed parameter values bound into PostgreSQL statements

use std::error::Error;
use std::str::FromStr;

use bytes::BytesMut;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tokio_postgres::types::{IsNull, ToSql, Type as PostgresType};

use crate::model::{CellValue, SqlType};
use crate::normalize::boolean::parse_bool_text;
use crate::parser::parse_timestamp;

/// A cell converted into its destination column type
#[derive(Clone, Debug, PartialEq)]
pub enum PgValue {
    /// PostgreSQL `BOOLEAN`
    Boolean(bool),
    /// PostgreSQL `INTEGER`
    Int32(i32),
    /// PostgreSQL `NUMERIC`
    Numeric(Decimal),
    /// PostgreSQL `TEXT`
    Text(String),
    /// PostgreSQL `TIMESTAMP` (no time zone)
    Timestamp(NaiveDateTime),
    Null,
}

impl ToSql for PgValue {
    fn to_sql(
        &self,
        ty: &PostgresType,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            PgValue::Boolean(v) => v.to_sql_checked(ty, out),
            // Pre-existing tables may use BIGINT where the type map says INTEGER
            PgValue::Int32(v) if *ty == PostgresType::INT8 => (*v as i64).to_sql_checked(ty, out),
            PgValue::Int32(v) => v.to_sql_checked(ty, out),
            PgValue::Numeric(v) => v.to_sql_checked(ty, out),
            PgValue::Text(v) => v.to_sql_checked(ty, out),
            PgValue::Timestamp(v) => v.to_sql_checked(ty, out),
            PgValue::Null => Ok(IsNull::Yes),
        }
    }

    fn accepts(ty: &PostgresType) -> bool {
        matches!(
            ty,
            &PostgresType::BOOL
                | &PostgresType::INT4
                | &PostgresType::INT8
                | &PostgresType::NUMERIC
                | &PostgresType::TEXT
                | &PostgresType::VARCHAR
                | &PostgresType::TIMESTAMP
        )
    }

    /// Each variant checks its own type inside `to_sql`
    fn to_sql_checked(
        &self,
        ty: &PostgresType,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        self.to_sql(ty, out)
    }
}

/// Convert a normalized cell into `target`; `None` if the value does not fit
pub fn coerce_cell(cell: &CellValue, target: SqlType) -> Option<PgValue> {
    if cell.is_null() {
        return Some(PgValue::Null);
    }
    match target {
        SqlType::Integer => to_i32(cell).map(PgValue::Int32),
        SqlType::Numeric => to_decimal(cell).map(PgValue::Numeric),
        SqlType::Text => Some(PgValue::Text(to_text(cell))),
        SqlType::Timestamp => match cell {
            CellValue::Timestamp(ts) => Some(PgValue::Timestamp(*ts)),
            CellValue::Text(s) => parse_timestamp(s).map(PgValue::Timestamp),
            _ => None,
        },
        SqlType::Boolean => match cell {
            CellValue::Bool(b) => Some(PgValue::Boolean(*b)),
            CellValue::Int(i) => Some(PgValue::Boolean(*i != 0)),
            CellValue::Text(s) => parse_bool_text(s).map(PgValue::Boolean),
            _ => None,
        },
    }
}

fn to_i32(cell: &CellValue) -> Option<i32> {
    match cell {
        CellValue::Int(i) => i32::try_from(*i).ok(),
        CellValue::Float(f) => float_to_i32(*f),
        CellValue::Bool(b) => Some(i32::from(*b)),
        CellValue::Text(s) => {
            let s = s.trim();
            s.parse::<i32>()
                .ok()
                // Integer columns with gaps are often written as floats ("3.0")
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_i32))
        }
        _ => None,
    }
}

fn float_to_i32(f: f64) -> Option<i32> {
    if f.is_finite() && f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

fn to_decimal(cell: &CellValue) -> Option<Decimal> {
    match cell {
        CellValue::Int(i) => Some(Decimal::from(*i)),
        CellValue::Float(f) => Decimal::try_from(*f).ok(),
        CellValue::Text(s) => {
            let s = s.trim();
            if s.contains(['e', 'E']) {
                Decimal::from_scientific(s).ok()
            } else {
                Decimal::from_str(s).ok()
            }
        }
        _ => None,
    }
}

fn to_text(cell: &CellValue) -> String {
    // NUL bytes are not valid in PostgreSQL text
    cell.display().replace('\0', "")
}
