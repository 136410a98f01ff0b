//! Destination column types and the per-table type map

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Storage type of a destination column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlType {
    Integer,
    Numeric,
    Text,
    Timestamp,
    Boolean,
}

impl SqlType {
    /// Type name as written in PostgreSQL DDL
    pub fn ddl_name(self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Numeric => "NUMERIC",
            SqlType::Text => "TEXT",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Boolean => "BOOLEAN",
        }
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ddl_name())
    }
}

impl std::str::FromStr for SqlType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "integer" | "int" | "int4" => Ok(SqlType::Integer),
            "numeric" | "decimal" => Ok(SqlType::Numeric),
            "text" => Ok(SqlType::Text),
            "timestamp" => Ok(SqlType::Timestamp),
            "boolean" | "bool" => Ok(SqlType::Boolean),
            _ => Err(format!("Unknown column type: {}", s)),
        }
    }
}

/// Ordered column name -> storage type map; declaration order is insert order
pub type TypeMap = IndexMap<String, SqlType>;

/// Build a [`TypeMap`] from `(name, type)` pairs
pub fn type_map<'a>(columns: impl IntoIterator<Item = (&'a str, SqlType)>) -> TypeMap {
    columns
        .into_iter()
        .map(|(name, ty)| (name.to_string(), ty))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_round_trip() {
        for ty in [
            SqlType::Integer,
            SqlType::Numeric,
            SqlType::Text,
            SqlType::Timestamp,
            SqlType::Boolean,
        ] {
            assert_eq!(ty.ddl_name().parse::<SqlType>().unwrap(), ty);
        }
        assert!("money".parse::<SqlType>().is_err());
    }

    #[test]
    fn test_type_map_keeps_order() {
        let map = type_map([
            ("b", SqlType::Text),
            ("a", SqlType::Integer),
            ("c", SqlType::Boolean),
        ]);
        let names: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&SqlType::Timestamp).unwrap();
        assert_eq!(json, "\"timestamp\"");
        let ty: SqlType = serde_json::from_str("\"numeric\"").unwrap();
        assert_eq!(ty, SqlType::Numeric);
    }
}
