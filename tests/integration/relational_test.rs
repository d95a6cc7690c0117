//! Live MySQL tests.
//!
//! These tests require a running MySQL server.
//! Set DATABASE_URL (mysql://...) to run them.

use data_agent::config::DatabaseConfig;
use data_agent::db::{QueryBackend, RelationalBackend, Value};

/// Helper to get the test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL")
        .ok()
        .filter(|url| url.starts_with("mysql:"))
}

fn get_test_backend() -> Option<RelationalBackend> {
    let url = get_test_database_url()?;
    Some(RelationalBackend::new(DatabaseConfig {
        url: Some(url),
        ..Default::default()
    }))
}

#[tokio::test]
async fn test_mysql_simple_select() {
    let Some(backend) = get_test_backend() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let rows = backend
        .fetch_rows("SELECT 1 AS num, 'hello' AS greeting, NULL AS nothing")
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["num"], Value::Int(1));
    assert_eq!(rows[0]["greeting"], Value::from("hello"));
    assert!(rows[0]["nothing"].is_null());
}

#[tokio::test]
async fn test_mysql_decimal_average() {
    let Some(backend) = get_test_backend() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    // AVG over integers yields DECIMAL in MySQL.
    let rows = backend
        .fetch_rows("SELECT AVG(n) AS avg_n FROM (SELECT 1 AS n UNION ALL SELECT 2) t")
        .await
        .unwrap();

    assert_eq!(rows[0]["avg_n"], Value::Float(1.5));
}

#[tokio::test]
async fn test_mysql_error_carries_sql() {
    let Some(backend) = get_test_backend() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let sql = "SELECT * FROM data_agent_missing_table";
    let err = backend.fetch_rows(sql).await.unwrap_err();

    assert_eq!(err.kind(), "ExecutionError");
    assert_eq!(err.sql(), Some(sql));
    assert!(err.to_string().contains("ERROR"));

    // The failed call released its connection.
    assert!(backend.fetch_rows("SELECT 1 AS ok").await.is_ok());
}
