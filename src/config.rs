//! Run configuration: connection, source directory, and table definitions

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, Result};
use crate::model::{type_map, SqlType, TypeMap};

/// Rows per batch read from a source file and written in one append
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Destination namespace used when none is configured
pub const DEFAULT_SCHEMA: &str = "data_warehouse";

/// PostgreSQL connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "data_warehouse".to_string(),
            user: "dwh_admin".to_string(),
            password: "dwh_admin".to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Key/value connection string understood by `tokio_postgres::connect`
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            quote_conn_value(&self.host),
            self.port,
            quote_conn_value(&self.database),
            quote_conn_value(&self.user),
            quote_conn_value(&self.password),
        )
    }
}

/// Quote a libpq key/value parameter so spaces and quotes survive
fn quote_conn_value(value: &str) -> String {
    if !value.is_empty() && !value.contains([' ', '\'', '\\']) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

/// One source file and the table it is loaded into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Destination table name
    pub table_name: String,
    /// Source file name, relative to the source directory
    pub csv_file: PathBuf,
    /// Columns parsed into timestamps
    #[serde(default)]
    pub parse_dates: Vec<String>,
    /// Columns normalized into tri-state booleans
    #[serde(default)]
    pub boolean_cols: Vec<String>,
    /// Full column type map, in insert order
    pub columns: TypeMap,
}

impl TableDefinition {
    /// Create a definition with no date or boolean columns
    pub fn new(table_name: impl Into<String>, csv_file: impl Into<PathBuf>, columns: TypeMap) -> Self {
        Self {
            table_name: table_name.into(),
            csv_file: csv_file.into(),
            parse_dates: Vec::new(),
            boolean_cols: Vec::new(),
            columns,
        }
    }

    /// Set the date columns
    pub fn with_parse_dates(mut self, columns: &[&str]) -> Self {
        self.parse_dates = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Set the boolean columns
    pub fn with_boolean_cols(mut self, columns: &[&str]) -> Self {
        self.boolean_cols = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Check that date and boolean columns are declared with a fitting type
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(LoadError::config(format!(
                "table {} declares no columns",
                self.table_name
            )));
        }
        let checks = [
            (&self.parse_dates, SqlType::Timestamp, "date"),
            (&self.boolean_cols, SqlType::Boolean, "boolean"),
        ];
        for (columns, expected, kind) in checks {
            for col in columns {
                match self.columns.get(col) {
                    None => {
                        return Err(LoadError::config(format!(
                            "{} column '{}' is not declared for table {}",
                            kind, col, self.table_name
                        )))
                    }
                    Some(ty) if *ty != expected => {
                        return Err(LoadError::config(format!(
                            "{} column '{}' of table {} is declared as {}",
                            kind, col, self.table_name, ty
                        )))
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }
}

/// Configuration for a load run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Destination database
    #[serde(flatten)]
    pub connection: ConnectionConfig,
    /// Directory holding every table's source file
    pub source_directory: PathBuf,
    /// Destination schema (namespace) for all tables
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Rows per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Tables, loaded in this order
    pub table_definitions: Vec<TableDefinition>,
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            source_directory: PathBuf::new(),
            schema: default_schema(),
            batch_size: DEFAULT_BATCH_SIZE,
            table_definitions: Vec::new(),
        }
    }
}

impl Config {
    /// Create a config with a source directory and no tables
    pub fn new(source_directory: PathBuf) -> Self {
        Self {
            source_directory,
            ..Default::default()
        }
    }

    /// Read a JSON config file
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            LoadError::config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// The four warehouse tables with local connection defaults
    pub fn builtin(source_directory: PathBuf) -> Self {
        Self::new(source_directory).with_tables(builtin_tables())
    }

    /// Set the destination schema
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Set the batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the table definitions
    pub fn with_tables(mut self, tables: Vec<TableDefinition>) -> Self {
        self.table_definitions = tables;
        self
    }

    /// Full path of a table's source file
    pub fn source_path(&self, table: &TableDefinition) -> PathBuf {
        self.source_directory.join(&table.csv_file)
    }

    /// Reject configurations that cannot produce a correct run
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(LoadError::config("batch_size must be greater than zero"));
        }
        if self.schema.is_empty() {
            return Err(LoadError::config("schema must not be empty"));
        }
        let mut seen = HashSet::new();
        for table in &self.table_definitions {
            if !seen.insert(table.table_name.as_str()) {
                return Err(LoadError::config(format!(
                    "table {} is defined more than once",
                    table.table_name
                )));
            }
            table.validate()?;
        }
        Ok(())
    }
}

fn builtin_tables() -> Vec<TableDefinition> {
    use SqlType::*;

    vec![
        TableDefinition::new(
            "customers",
            "customers.csv",
            type_map([
                ("customer_id", Integer),
                ("first_name", Text),
                ("last_name", Text),
                ("email", Text),
                ("phone_number", Text),
                ("registration_date", Timestamp),
                ("customer_segment", Text),
                ("preferred_channel", Text),
                ("age_group", Text),
                ("income_level", Text),
                ("avg_order_value", Numeric),
                ("promo_sensitivity", Numeric),
                ("email_opt_in", Boolean),
                ("sms_opt_in", Boolean),
                ("push_opt_in", Boolean),
                ("last_purchase_date", Timestamp),
                ("total_lifetime_orders", Integer),
                ("preferred_category", Text),
            ]),
        )
        .with_parse_dates(&["registration_date", "last_purchase_date"])
        .with_boolean_cols(&["email_opt_in", "sms_opt_in", "push_opt_in"]),
        TableDefinition::new(
            "promotions",
            "promotions.csv",
            type_map([
                ("promotion_id", Integer),
                ("campaign_name", Text),
                ("promo_type", Text),
                ("discount_value", Numeric),
                ("min_order_value", Numeric),
                ("start_date", Timestamp),
                ("end_date", Timestamp),
                ("campaign_duration_days", Integer),
                ("target_segment", Text),
                ("campaign_channel", Text),
                ("campaign_objective", Text),
                ("target_category", Text),
                ("expected_response_rate", Numeric),
                ("budget_allocated", Numeric),
                ("cost_per_acquisition", Numeric),
            ]),
        )
        .with_parse_dates(&["start_date", "end_date"]),
        TableDefinition::new(
            "orders",
            "orders.csv",
            type_map([
                ("order_id", Integer),
                ("customer_id", Integer),
                ("order_date", Timestamp),
                ("order_status", Text),
                ("promotion_id", Integer),
                ("order_channel", Text),
                ("order_value", Numeric),
                ("attributed_to_promo", Boolean),
                ("customer_segment_at_time", Text),
            ]),
        )
        .with_parse_dates(&["order_date"])
        .with_boolean_cols(&["attributed_to_promo"]),
        TableDefinition::new(
            "order_items",
            "order_items.csv",
            type_map([
                ("order_item_id", Integer),
                ("order_id", Integer),
                ("product_id", Integer),
                ("product_category", Text),
                ("quantity", Integer),
                ("unit_price", Numeric),
                ("promotion_id", Integer),
                ("attributed_to_promo", Boolean),
            ]),
        )
        .with_boolean_cols(&["attributed_to_promo"]),
    ]
}
