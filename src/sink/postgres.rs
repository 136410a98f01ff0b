//! PostgreSQL destination using multi-row `INSERT` statements

use tokio::runtime::{Builder, Runtime};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info};

use crate::config::{ConnectionConfig, TableDefinition};
use crate::error::{LoadError, Result};
use crate::model::RowBatch;

use super::{insert_columns, typed_rows, BatchSink};

/// Upper bound on bind parameters in one PostgreSQL statement
pub const MAX_BIND_PARAMS: usize = u16::MAX as usize;

/// Quote an identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn qualified_name(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// `CREATE TABLE IF NOT EXISTS` for the table's full type map
pub fn create_table_sql(schema: &str, table: &TableDefinition) -> String {
    let columns = table
        .columns
        .iter()
        .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.ddl_name()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        qualified_name(schema, &table.table_name),
        columns
    )
}

/// Multi-row `INSERT` with `$n` placeholders for `rows` rows of `columns`
pub fn insert_sql(schema: &str, table: &str, columns: &[&str], rows: usize) -> String {
    let width = columns.len();
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ",
        qualified_name(schema, table),
        column_list
    );
    for row in 0..rows {
        if row > 0 {
            sql.push_str(", ");
        }
        let placeholders = (1..=width)
            .map(|col| format!("${}", row * width + col))
            .collect::<Vec<_>>()
            .join(", ");
        sql.push('(');
        sql.push_str(&placeholders);
        sql.push(')');
    }
    sql
}

/// Rows that fit in one statement without exceeding [`MAX_BIND_PARAMS`]
pub fn rows_per_statement(width: usize) -> usize {
    (MAX_BIND_PARAMS / width.max(1)).max(1)
}

/// Blocking PostgreSQL sink.
///
/// Owns a current-thread runtime and drives the async client with
/// `block_on`, so every call returns only after the database has answered.
pub struct PostgresSink {
    runtime: Runtime,
    client: Client,
}

impl PostgresSink {
    /// Connect using the configured parameters
    pub fn connect(conn: &ConnectionConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(LoadError::Runtime)?;

        let (client, connection) =
            runtime.block_on(tokio_postgres::connect(&conn.connection_string(), NoTls))?;
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                error!("postgres connection error: {}", e);
            }
        });

        info!(
            host = %conn.host,
            port = conn.port,
            database = %conn.database,
            "connected"
        );
        Ok(Self { runtime, client })
    }
}

impl BatchSink for PostgresSink {
    fn prepare(&mut self, table: &TableDefinition, schema: &str) -> Result<()> {
        let sql = create_table_sql(schema, table);
        debug!(%sql, "ensure table");
        self.runtime.block_on(self.client.batch_execute(&sql))?;
        Ok(())
    }

    fn append(&mut self, table: &TableDefinition, schema: &str, batch: &RowBatch) -> Result<()> {
        let columns = insert_columns(table, batch);
        if batch.is_empty() || columns.is_empty() {
            return Ok(());
        }
        let rows = typed_rows(table, &columns, batch)?;
        let names: Vec<&str> = columns.iter().map(|c| c.name).collect();
        let chunk_rows = rows_per_statement(names.len());

        let runtime = &self.runtime;
        let client = &mut self.client;
        runtime.block_on(async {
            let tx = client.transaction().await?;
            for chunk in rows.chunks(chunk_rows) {
                let sql = insert_sql(schema, &table.table_name, &names, chunk.len());
                let params: Vec<&(dyn ToSql + Sync)> = chunk
                    .iter()
                    .flatten()
                    .map(|v| v as &(dyn ToSql + Sync))
                    .collect();
                let inserted = tx.execute(sql.as_str(), &params).await?;
                debug!(table = %table.table_name, rows = inserted, "insert");
            }
            tx.commit().await
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{type_map, SqlType};

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("orders"), "\"orders\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_create_table_sql() {
        let table = TableDefinition::new(
            "orders",
            "orders.csv",
            type_map([
                ("order_id", SqlType::Integer),
                ("order_date", SqlType::Timestamp),
                ("attributed_to_promo", SqlType::Boolean),
            ]),
        );
        assert_eq!(
            create_table_sql("raw", &table),
            "CREATE TABLE IF NOT EXISTS \"raw\".\"orders\" (\"order_id\" INTEGER, \
             \"order_date\" TIMESTAMP, \"attributed_to_promo\" BOOLEAN)"
        );
    }

    #[test]
    fn test_insert_sql() {
        assert_eq!(
            insert_sql("raw", "t", &["a", "b"], 2),
            "INSERT INTO \"raw\".\"t\" (\"a\", \"b\") VALUES ($1, $2), ($3, $4)"
        );
        assert_eq!(
            insert_sql("raw", "t", &["a"], 1),
            "INSERT INTO \"raw\".\"t\" (\"a\") VALUES ($1)"
        );
    }

    #[test]
    fn test_rows_per_statement() {
        assert_eq!(rows_per_statement(1), 65535);
        // 5000 rows of 18 columns need two statements
        assert_eq!(rows_per_statement(18), 3640);
        assert!(5000usize.div_ceil(rows_per_statement(18)) == 2);
        assert_eq!(rows_per_statement(0), 65535);
    }
}
