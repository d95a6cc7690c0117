//! SQL execution against the selected target.
//!
//! Holds one backend per `ExecutionTarget` and dispatches on the enum.
//! Failures are logged and returned; nothing is retried.

use std::time::Instant;

use crate::config::Config;
use crate::db::{ExecutionTarget, QueryBackend, RelationalBackend, Row, WarehouseBackend};
use crate::error::Result;

/// Executes validated SQL on the warehouse or the relational database.
pub struct SqlExecutor {
    warehouse: Box<dyn QueryBackend>,
    relational: Box<dyn QueryBackend>,
}

impl SqlExecutor {
    /// Creates an executor from explicit backends.
    pub fn with_backends(
        warehouse: Box<dyn QueryBackend>,
        relational: Box<dyn QueryBackend>,
    ) -> Self {
        Self {
            warehouse,
            relational,
        }
    }

    /// Creates an executor with the BigQuery and sqlx backends.
    ///
    /// No connection is made here; missing settings surface on first use.
    pub fn from_config(config: &Config) -> Self {
        Self::with_backends(
            Box::new(WarehouseBackend::from_config(config)),
            Box::new(RelationalBackend::new(config.database.clone())),
        )
    }

    fn backend(&self, target: ExecutionTarget) -> &dyn QueryBackend {
        match target {
            ExecutionTarget::Warehouse => self.warehouse.as_ref(),
            ExecutionTarget::RelationalDb => self.relational.as_ref(),
        }
    }

    /// Executes one statement on `target` and returns every row.
    pub async fn execute(&self, sql: &str, target: ExecutionTarget) -> Result<Vec<Row>> {
        let start = Instant::now();
        let result = self.backend(target).fetch_rows(sql).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(rows) => tracing::info!(
                backend = %target,
                rows = rows.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Query executed"
            ),
            Err(e) => tracing::error!(backend = %target, sql = %sql, error = %e, "Query failed"),
        }

        result
    }
}
