//! Live BigQuery tests.
//!
//! These tests require a BigQuery project and a service-account key.
//! Set BIGQUERY_PROJECT and GOOGLE_APPLICATION_CREDENTIALS to run them.

use data_agent::db::{QueryBackend, Value, WarehouseBackend};
use std::path::PathBuf;

fn get_test_backend() -> Option<WarehouseBackend> {
    let project = std::env::var("BIGQUERY_PROJECT").ok()?;
    let credentials = std::env::var("GOOGLE_APPLICATION_CREDENTIALS").ok()?;
    Some(WarehouseBackend::new(
        Some(project),
        Some(PathBuf::from(credentials)),
    ))
}

#[tokio::test]
async fn test_bigquery_typed_rows() {
    let Some(backend) = get_test_backend() else {
        eprintln!("Skipping test: BIGQUERY_PROJECT not set");
        return;
    };

    let rows = backend
        .fetch_rows("SELECT 1 AS num, 2.5 AS ratio, 'hello' AS greeting, TRUE AS flag, NULL AS nothing")
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row["num"], Value::Int(1));
    assert_eq!(row["ratio"], Value::Float(2.5));
    assert_eq!(row["greeting"], Value::from("hello"));
    assert_eq!(row["flag"], Value::Bool(true));
    assert!(row["nothing"].is_null());
}

#[tokio::test]
async fn test_bigquery_error_carries_sql() {
    let Some(backend) = get_test_backend() else {
        eprintln!("Skipping test: BIGQUERY_PROJECT not set");
        return;
    };

    let sql = "SELECT * FROM data_agent_missing_dataset.students";
    let err = backend.fetch_rows(sql).await.unwrap_err();

    assert_eq!(err.kind(), "ExecutionError");
    assert_eq!(err.sql(), Some(sql));
}
