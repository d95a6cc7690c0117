//! Relational database backend.
//!
//! Executes statements against MySQL (or SQLite for local use) through sqlx.
//! Every call builds its own single-connection pool as the connection broker,
//! runs the statement on its only connection and then closes the broker,
//! whatever the outcome.

use crate::config::DatabaseConfig;
use crate::db::{QueryBackend, Row, Value};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Column as SqlxColumn, ColumnIndex, Decode, Row as SqlxRow, Type, TypeInfo, ValueRef};
use std::time::Duration;
use tracing::debug;

/// How long to wait for the broker to hand out a connection.
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Relational database backend.
#[derive(Debug, Clone)]
pub struct RelationalBackend {
    config: DatabaseConfig,
}

impl RelationalBackend {
    /// Creates a backend for the given connection settings. No connection is
    /// opened until a statement is executed.
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl QueryBackend for RelationalBackend {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>> {
        let url = self.config.connection_url()?;
        debug!(
            "Opening scoped connection to {}",
            self.config.display_string()
        );

        let result = if url.starts_with("mysql:") {
            fetch_mysql(&url, sql).await
        } else if url.starts_with("sqlite:") {
            fetch_sqlite(&url, sql).await
        } else {
            return Err(AgentError::config(format!(
                "Unsupported database URL scheme in '{}'. Expected mysql:// or sqlite://",
                self.config.display_string()
            )));
        };

        debug!("Scoped connection released");
        result.map_err(|e| AgentError::execution(sql, format_query_error(e)))
    }
}

async fn fetch_mysql(url: &str, sql: &str) -> std::result::Result<Vec<Row>, sqlx::Error> {
    let broker = MySqlPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect_lazy(url)?;

    let result = sqlx::raw_sql(sql)
        .fetch_all(&broker)
        .await
        .map(|rows| rows.iter().map(convert_row).collect());

    // Close the broker on every path.
    broker.close().await;
    result
}

async fn fetch_sqlite(url: &str, sql: &str) -> std::result::Result<Vec<Row>, sqlx::Error> {
    let broker = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect_lazy(url)?;

    let result = sqlx::raw_sql(sql)
        .fetch_all(&broker)
        .await
        .map(|rows| rows.iter().map(convert_row).collect());

    broker.close().await;
    result
}

/// Converts a driver row into a column-name-keyed `Row`.
fn convert_row<R>(row: &R) -> Row
where
    R: SqlxRow,
    usize: ColumnIndex<R>,
    for<'r> bool: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> i64: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> f64: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> String: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> Vec<u8>: Decode<'r, R::Database> + Type<R::Database>,
{
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| {
            (
                col.name().to_string(),
                convert_value(row, i, col.type_info().name()),
            )
        })
        .collect()
}

/// Converts a single column value based on the reported type name.
///
/// Unknown types fall through a decode chain (text, integer, float, bytes)
/// before giving up with NULL.
fn convert_value<R>(row: &R, index: usize, type_name: &str) -> Value
where
    R: SqlxRow,
    usize: ColumnIndex<R>,
    for<'r> bool: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> i64: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> f64: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> String: Decode<'r, R::Database> + Type<R::Database>,
    for<'r> Vec<u8>: Decode<'r, R::Database> + Type<R::Database>,
{
    let is_null = row
        .try_get_raw(index)
        .map(|raw| raw.is_null())
        .unwrap_or(true);
    if is_null {
        return Value::Null;
    }

    let type_name = type_name.to_uppercase();
    let typed = match type_name.as_str() {
        "BOOL" | "BOOLEAN" => decode::<bool, R>(row, index).map(Value::Bool),

        t if t.contains("INT") && t.contains("UNSIGNED") => row
            .try_get_unchecked::<i64, _>(index)
            .ok()
            .map(Value::Int),

        t if t.contains("INT") => decode::<i64, R>(row, index).map(Value::Int),

        "FLOAT" | "DOUBLE" | "REAL" | "DOUBLE PRECISION" => {
            decode::<f64, R>(row, index).map(Value::Float)
        }

        // DECIMAL arrives as text on the wire.
        "DECIMAL" | "NUMERIC" => row
            .try_get_unchecked::<String, _>(index)
            .ok()
            .map(|s| match s.parse::<f64>() {
                Ok(f) => Value::Float(f),
                Err(_) => Value::String(s),
            }),

        t if t.contains("BLOB") || t.contains("BINARY") => {
            decode::<Vec<u8>, R>(row, index).map(Value::Bytes)
        }

        _ => None,
    };

    typed
        .or_else(|| decode::<String, R>(row, index).map(Value::String))
        .or_else(|| decode::<i64, R>(row, index).map(Value::Int))
        .or_else(|| decode::<f64, R>(row, index).map(Value::Float))
        .or_else(|| decode::<Vec<u8>, R>(row, index).map(Value::Bytes))
        .or_else(|| {
            row.try_get_unchecked::<String, _>(index)
                .ok()
                .map(Value::String)
        })
        .unwrap_or(Value::Null)
}

fn decode<T, R>(row: &R, index: usize) -> Option<T>
where
    R: SqlxRow,
    usize: ColumnIndex<R>,
    for<'r> T: Decode<'r, R::Database> + Type<R::Database>,
{
    row.try_get::<T, _>(index).ok()
}

/// Formats a driver error, preferring the database's own message and code.
fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => match db_error.code() {
            Some(code) => format!("ERROR {}: {}", code, db_error.message()),
            None => format!("ERROR: {}", db_error.message()),
        },
        None => error.to_string(),
    }
}
