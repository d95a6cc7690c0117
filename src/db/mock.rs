//! Mock query backend for testing.
//!
//! Returns predefined rows (or a predefined failure) and records every
//! statement it was asked to run.

use super::{QueryBackend, Row};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A mock backend that returns canned results.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    rows: Vec<Row>,
    failure: Option<String>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    /// Creates a mock backend that returns no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock backend that returns the given rows for every statement.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Creates a mock backend whose every execution fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns a handle to the statements executed so far.
    ///
    /// The handle stays valid after the backend is moved into an executor.
    pub fn executed(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.executed)
    }
}

#[async_trait]
impl QueryBackend for MockBackend {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }

        match &self.failure {
            Some(message) => Err(AgentError::execution(sql, message.clone())),
            None => Ok(self.rows.clone()),
        }
    }
}
