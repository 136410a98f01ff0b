//! Tri-state boolean normalization

use tracing::debug;

use crate::model::CellValue;

/// Lexical table for textual columns. Lookup is case-sensitive and exact.
const TEXT_BOOLEANS: &[(&str, Option<bool>)] = &[
    ("True", Some(true)),
    ("False", Some(false)),
    ("true", Some(true)),
    ("false", Some(false)),
    ("t", Some(true)),
    ("f", Some(false)),
    ("1", Some(true)),
    ("0", Some(false)),
    ("", None),
];

/// Literals a raw CSV column must consist of to be read as boolean-typed
const BOOL_LITERALS: &[(&str, bool)] = &[
    ("True", true),
    ("TRUE", true),
    ("true", true),
    ("False", false),
    ("FALSE", false),
    ("false", false),
];

/// Declared kind of a column, decided once per column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every non-null value is already a boolean
    Boolean,
    /// Every non-null value is an integer or float
    Numeric,
    /// Text, or a mix of kinds
    Textual,
    /// Timestamps, or nothing but nulls
    Other,
}

impl ColumnKind {
    /// Classify a column from its non-null values
    pub fn classify(values: &[CellValue]) -> Self {
        let mut saw_bool = false;
        let mut saw_number = false;
        let mut saw_text = false;

        for value in values {
            match value {
                CellValue::Null => {}
                CellValue::Bool(_) => saw_bool = true,
                CellValue::Int(_) | CellValue::Float(_) => saw_number = true,
                CellValue::Text(_) => saw_text = true,
                CellValue::Timestamp(_) => return ColumnKind::Other,
            }
        }

        match (saw_bool, saw_number, saw_text) {
            (false, false, false) => ColumnKind::Other,
            (true, false, false) => ColumnKind::Boolean,
            (false, true, false) => ColumnKind::Numeric,
            _ => ColumnKind::Textual,
        }
    }
}

/// Normalize a column into tri-state booleans (`Bool` or `Null`).
///
/// Values missing from the lexical table become `Null`, the same as an
/// explicit empty value. This is kept for compatibility with existing loads,
/// though it silently hides typos such as `"yes"` or `"T"`.
pub fn to_bool_column(values: Vec<CellValue>) -> Vec<CellValue> {
    match ColumnKind::classify(&values) {
        ColumnKind::Boolean => values,
        ColumnKind::Numeric => values.iter().map(|v| numeric_to_bool(v).into()).collect(),
        ColumnKind::Textual => {
            let mut unmapped = 0usize;
            let out: Vec<CellValue> = values
                .iter()
                .map(|v| {
                    lookup(v)
                        .unwrap_or_else(|| {
                            unmapped += 1;
                            None
                        })
                        .into()
                })
                .collect();
            if unmapped > 0 {
                debug!(unmapped, "unrecognized boolean values stored as null");
            }
            out
        }
        ColumnKind::Other => values.iter().map(|v| coerce(v).into()).collect(),
    }
}

/// Normalize a column as read from CSV, where every cell is `Text` or `Null`.
///
/// The column is first typed the way a CSV reader infers a column: all
/// boolean literals become booleans, all numbers become numbers, anything
/// else stays text. The typed column is then passed to [`to_bool_column`].
pub fn normalize_raw_column(values: Vec<CellValue>) -> Vec<CellValue> {
    to_bool_column(infer_raw_column(values))
}

fn infer_raw_column(values: Vec<CellValue>) -> Vec<CellValue> {
    // (all boolean literals, all numbers), or None when there is no text
    let shape = {
        let texts: Vec<&str> = values
            .iter()
            .filter_map(|v| match v {
                CellValue::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some((
                texts.iter().all(|s| bool_literal(s).is_some()),
                texts.iter().all(|s| parse_number(s).is_some()),
            ))
        }
    };

    match shape {
        Some((true, _)) => values
            .into_iter()
            .map(|v| match v {
                CellValue::Text(s) => bool_literal(&s).into(),
                other => other,
            })
            .collect(),
        Some((false, true)) => values
            .into_iter()
            .map(|v| match v {
                CellValue::Text(s) => parse_number(&s).unwrap_or(CellValue::Null),
                other => other,
            })
            .collect(),
        _ => values,
    }
}

/// Strict text-to-boolean parse for declared boolean columns that are not
/// normalized; `None` when the text is not a known spelling
pub fn parse_bool_text(s: &str) -> Option<bool> {
    lookup_text(s).flatten().or_else(|| bool_literal(s))
}

fn lookup_text(s: &str) -> Option<Option<bool>> {
    TEXT_BOOLEANS
        .iter()
        .find(|(key, _)| *key == s)
        .map(|(_, b)| *b)
}

fn bool_literal(s: &str) -> Option<bool> {
    BOOL_LITERALS
        .iter()
        .find(|(lit, _)| *lit == s)
        .map(|(_, b)| *b)
}

fn parse_number(s: &str) -> Option<CellValue> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(CellValue::Int(i));
    }
    s.parse::<f64>().ok().map(CellValue::Float)
}

/// Direct cast: nonzero is true, zero is false
fn numeric_to_bool(value: &CellValue) -> Option<bool> {
    match value {
        CellValue::Int(i) => Some(*i != 0),
        CellValue::Float(f) if f.is_nan() => None,
        CellValue::Float(f) => Some(*f != 0.0),
        _ => None,
    }
}

/// Lexical lookup. Outer `None` means the value is not in the table.
fn lookup(value: &CellValue) -> Option<Option<bool>> {
    match value {
        CellValue::Null => Some(None),
        CellValue::Bool(b) => Some(Some(*b)),
        CellValue::Int(1) => Some(Some(true)),
        CellValue::Int(0) => Some(Some(false)),
        CellValue::Float(f) if *f == 1.0 => Some(Some(true)),
        CellValue::Float(f) if *f == 0.0 => Some(Some(false)),
        CellValue::Text(s) => lookup_text(s),
        _ => None,
    }
}

/// Generic tri-state coercion for columns that are neither clearly typed nor text
fn coerce(value: &CellValue) -> Option<bool> {
    match value {
        CellValue::Bool(b) => Some(*b),
        CellValue::Int(_) | CellValue::Float(_) => numeric_to_bool(value),
        CellValue::Text(_) => lookup(value).flatten(),
        CellValue::Null | CellValue::Timestamp(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bools(values: Vec<CellValue>) -> Vec<Option<bool>> {
        to_bool_column(values).iter().map(CellValue::as_bool).collect()
    }

    fn texts(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|s| CellValue::from(*s)).collect()
    }

    #[test]
    fn test_truthy_values() {
        for v in [
            CellValue::from("True"),
            CellValue::from("true"),
            CellValue::from("t"),
            CellValue::from("1"),
            CellValue::Int(1),
            CellValue::Bool(true),
        ] {
            assert_eq!(bools(vec![v.clone()]), vec![Some(true)], "value {:?}", v);
        }
    }

    #[test]
    fn test_falsy_values() {
        for v in [
            CellValue::from("False"),
            CellValue::from("false"),
            CellValue::from("f"),
            CellValue::from("0"),
            CellValue::Int(0),
            CellValue::Bool(false),
        ] {
            assert_eq!(bools(vec![v.clone()]), vec![Some(false)], "value {:?}", v);
        }
    }

    #[test]
    fn test_unknown_values() {
        assert_eq!(bools(vec![CellValue::from("")]), vec![None]);
        assert_eq!(bools(vec![CellValue::Null]), vec![None]);
        assert_eq!(bools(vec![]), Vec::<Option<bool>>::new());
    }

    #[test]
    fn test_unmapped_strings_become_unknown() {
        assert_eq!(
            bools(texts(&["yes", "maybe", "TRUE", "T", "t"])),
            vec![None, None, None, None, Some(true)]
        );
    }

    #[test]
    fn test_numeric_cast() {
        assert_eq!(
            bools(vec![
                CellValue::Int(0),
                CellValue::Int(7),
                CellValue::Int(-1),
                CellValue::Float(0.0),
                CellValue::Float(2.5),
                CellValue::Null,
            ]),
            vec![Some(false), Some(true), Some(true), Some(false), Some(true), None]
        );
    }

    #[test]
    fn test_boolean_column_passes_through() {
        let column = vec![CellValue::Bool(true), CellValue::Null, CellValue::Bool(false)];
        assert_eq!(ColumnKind::classify(&column), ColumnKind::Boolean);
        assert_eq!(to_bool_column(column.clone()), column);
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            ColumnKind::classify(&[CellValue::Int(1), CellValue::Float(0.5)]),
            ColumnKind::Numeric
        );
        assert_eq!(
            ColumnKind::classify(&[CellValue::Int(1), CellValue::from("t")]),
            ColumnKind::Textual
        );
        assert_eq!(ColumnKind::classify(&[CellValue::Null]), ColumnKind::Other);
    }

    #[test]
    fn test_mixed_column_uses_lookup() {
        // Mixed columns go through the lexical table, so 2 is unmapped there
        assert_eq!(
            bools(vec![
                CellValue::Int(1),
                CellValue::Int(2),
                CellValue::from("f"),
                CellValue::Bool(true),
            ]),
            vec![Some(true), None, Some(false), Some(true)]
        );
    }

    #[test]
    fn test_raw_column_mixed_tokens() {
        let raw = vec![
            CellValue::from("1"),
            CellValue::from("0"),
            CellValue::Null,
            CellValue::from("t"),
            CellValue::from("f"),
        ];
        let out: Vec<_> = normalize_raw_column(raw).iter().map(CellValue::as_bool).collect();
        assert_eq!(out, vec![Some(true), Some(false), None, Some(true), Some(false)]);
    }

    #[test]
    fn test_raw_column_numeric() {
        let raw = vec![CellValue::from("0"), CellValue::from("3"), CellValue::Null];
        let out: Vec<_> = normalize_raw_column(raw).iter().map(CellValue::as_bool).collect();
        assert_eq!(out, vec![Some(false), Some(true), None]);
    }

    #[test]
    fn test_raw_column_boolean_literals() {
        let raw = texts(&["TRUE", "False", "true"]);
        let out: Vec<_> = normalize_raw_column(raw).iter().map(CellValue::as_bool).collect();
        assert_eq!(out, vec![Some(true), Some(false), Some(true)]);
    }

    #[test]
    fn test_raw_column_text_falls_back_to_lookup() {
        let raw = texts(&["t", "yes", "TRUE"]);
        let out: Vec<_> = normalize_raw_column(raw).iter().map(CellValue::as_bool).collect();
        assert_eq!(out, vec![Some(true), None, None]);
    }

    #[test]
    fn test_parse_bool_text() {
        assert_eq!(parse_bool_text("t"), Some(true));
        assert_eq!(parse_bool_text("FALSE"), Some(false));
        assert_eq!(parse_bool_text(""), None);
        assert_eq!(parse_bool_text("yes"), None);
    }
}
