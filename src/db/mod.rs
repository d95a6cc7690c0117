//! Database abstraction layer for data-agent.
//!
//! Provides a trait-based interface over the two execution backends, so the
//! executor can dispatch on a closed `ExecutionTarget` instead of comparing
//! strings at each call site.

mod mock;
mod relational;
mod schema;
mod types;
mod warehouse;

pub use mock::MockBackend;
pub use relational::RelationalBackend;
pub use schema::{Column, ColumnType, SchemaDescriptor};
pub use types::{Row, Value};
pub use warehouse::WarehouseBackend;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend that validated SQL is executed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionTarget {
    /// Columnar warehouse (BigQuery).
    Warehouse,
    /// Managed relational database (MySQL, or SQLite for local use).
    #[default]
    RelationalDb,
}

impl ExecutionTarget {
    /// Returns the target as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warehouse => "warehouse",
            Self::RelationalDb => "relational_db",
        }
    }

    /// SQL dialect the model is asked to produce for this target.
    pub fn dialect(&self) -> &'static str {
        match self {
            Self::Warehouse => "BigQuery Standard SQL",
            Self::RelationalDb => "MySQL 8",
        }
    }
}

impl FromStr for ExecutionTarget {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warehouse" | "bigquery" => Ok(Self::Warehouse),
            "relational_db" | "relational-db" | "cloudsql" | "mysql" | "sqlite" => {
                Ok(Self::RelationalDb)
            }
            _ => Err(format!(
                "Unknown execution target: {s}. Expected: warehouse or relational-db"
            )),
        }
    }
}

impl fmt::Display for ExecutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait implemented by each execution backend.
///
/// Implementations materialize every result row before returning.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Executes one statement and returns all rows keyed by column name.
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>>;
}
