//! Configuration file tests.
//!
//! Loads TOML files from disk and checks that the settings flow through the
//! pipeline.

use super::{seed_sqlite, STUDENTS_DDL};
use data_agent::config::Config;
use data_agent::db::{ColumnType, ExecutionTarget, Value};
use data_agent::query::QueryPipeline;

#[tokio::test]
async fn test_custom_schema_and_fallback_rules() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shop.db");
    seed_sqlite(
        &db_path,
        "CREATE TABLE orders (order_id INTEGER PRIMARY KEY, customer TEXT, total REAL);
         INSERT INTO orders VALUES (1, 'ada', 10.0), (2, 'ada', 10.0), (3, 'bob', 4.0);",
    )
    .await;

    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[model]
provider = "rules"

[database]
url = "sqlite://{}"

[schema]
table_name = "orders"
columns = [
  {{ name = "order_id", type = "INT", primary_key = true }},
  {{ name = "customer", type = "VARCHAR" }},
  {{ name = "total", type = "DECIMAL" }},
]

[fallback]
default_average_column = "total"
average_keywords = []
sample_limit = 2
"#,
            db_path.display()
        ),
    )
    .unwrap();

    let config = Config::load_from_file(&config_path).unwrap();
    assert_eq!(config.schema.table_name, "orders");
    assert_eq!(config.schema.columns[2].data_type, ColumnType::Decimal);

    let pipeline = QueryPipeline::from_config(&config, false).unwrap();

    let duplicates = pipeline
        .ask("find duplicates", ExecutionTarget::RelationalDb)
        .await
        .unwrap();
    assert_eq!(
        duplicates.sql,
        "SELECT customer, total, COUNT(*) AS duplicate_count FROM orders GROUP BY customer, total HAVING COUNT(*) > 1;"
    );
    assert_eq!(duplicates.rows.len(), 1);
    assert_eq!(duplicates.rows[0]["customer"], Value::from("ada"));
    assert_eq!(duplicates.rows[0]["duplicate_count"], Value::Int(2));

    let average = pipeline
        .ask("average order", ExecutionTarget::RelationalDb)
        .await
        .unwrap();
    assert_eq!(average.sql, "SELECT AVG(total) AS avg_total FROM orders;");
    assert_eq!(average.rows[0]["avg_total"], Value::Float(8.0));

    // The default summary names students columns; the orders columns are used instead.
    let summary = pipeline
        .ask("summary", ExecutionTarget::RelationalDb)
        .await
        .unwrap();
    assert_eq!(
        summary.sql,
        "SELECT COUNT(*) AS total_rows, AVG(total) AS avg_total FROM orders;"
    );
    assert_eq!(summary.rows[0]["total_rows"], Value::Int(3));
    assert_eq!(summary.rows[0]["avg_total"], Value::Float(8.0));

    let sample = pipeline
        .ask("show orders", ExecutionTarget::RelationalDb)
        .await
        .unwrap();
    assert_eq!(sample.rows.len(), 2);
}

#[tokio::test]
async fn test_missing_database_settings_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[model]\nprovider = \"rules\"\n").unwrap();

    let config = Config::load_from_file(&config_path).unwrap();
    let pipeline = QueryPipeline::from_config(&config, false).unwrap();

    let err = pipeline
        .ask("count duplicates", ExecutionTarget::RelationalDb)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ConfigurationError");
}

#[tokio::test]
async fn test_students_schema_from_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("school.db");
    seed_sqlite(&db_path, STUDENTS_DDL).await;

    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!("[database]\nurl = \"sqlite://{}\"\n", db_path.display()),
    )
    .unwrap();

    let config = Config::load_from_file(&config_path).unwrap();
    let pipeline = QueryPipeline::from_config(&config, true).unwrap();
    let result = pipeline
        .ask("overview", ExecutionTarget::RelationalDb)
        .await
        .unwrap();

    assert_eq!(result.rows[0]["total_rows"], Value::Int(0));
}
