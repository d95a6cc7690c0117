//! End-to-end pipeline tests.
//!
//! Drives question → translation → guard → SQLite execution with a scripted
//! model standing in for the hosted service.

use super::{seed_sqlite, sqlite_config, STUDENTS_DDL};
use data_agent::config::Config;
use data_agent::db::{ExecutionTarget, Value};
use data_agent::llm::{MockTextGenerator, TranslationSource};
use data_agent::query::{QueryPipeline, SqlExecutor, Translator};
use data_agent::safety::SqlGuard;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const SEED_ROWS: &str = "INSERT INTO students VALUES
    (1, 'Asha', 20, 'CS', 90, 25, 60),
    (1, 'Asha', 20, 'CS', 90, 25, 60),
    (1, 'Asha', 20, 'CS', 90, 25, 60),
    (2, 'Ben', 21, 'EE', 75, 20, 50),
    (3, 'Chen', 22, 'ME', 80, 22, 55),
    (3, 'Chen', 22, 'ME', 80, 22, 55);";

async fn students_db(rows: &str) -> (TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("school.db");
    seed_sqlite(&path, &format!("{STUDENTS_DDL}\n{rows}")).await;
    let config = sqlite_config(&path);
    (dir, config)
}

fn pipeline_with(config: &Config, mock: MockTextGenerator) -> QueryPipeline {
    QueryPipeline::new(
        Translator::from_config(config, Some(Box::new(mock))),
        SqlGuard::from_config(&config.guard),
        SqlExecutor::from_config(config),
    )
}

#[tokio::test]
async fn test_count_duplicates_with_gateway_unavailable() {
    let (_dir, config) = students_db(SEED_ROWS).await;
    let mock = MockTextGenerator::unavailable();
    let pipeline = pipeline_with(&config, mock.clone());

    let result = pipeline
        .ask("count duplicates", ExecutionTarget::RelationalDb)
        .await
        .unwrap();

    assert_eq!(mock.call_count(), 1);
    assert!(result.sql.contains("HAVING COUNT(*) > 1"));
    assert_eq!(result.rows.len(), 2);

    for row in &result.rows {
        let keys: Vec<_> = row.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "student_id",
                "name",
                "age",
                "department",
                "attendance_percentage",
                "internal_marks",
                "external_marks",
                "duplicate_count",
            ]
        );
        assert!(row["duplicate_count"].as_i64().unwrap() > 1);
    }

    let asha = result
        .rows
        .iter()
        .find(|r| r["name"] == Value::from("Asha"))
        .unwrap();
    assert_eq!(asha["duplicate_count"], Value::Int(3));
}

#[tokio::test]
async fn test_summary_on_empty_table() {
    let (_dir, config) = students_db("").await;
    let pipeline = pipeline_with(&config, MockTextGenerator::unavailable());

    let result = pipeline
        .ask("give me a summary", ExecutionTarget::RelationalDb)
        .await
        .unwrap();

    assert_eq!(
        result.sql,
        "SELECT COUNT(*) AS total_rows, AVG(age) AS avg_age, AVG(attendance_percentage) AS avg_attendance, AVG(internal_marks) AS avg_internal, AVG(external_marks) AS avg_external FROM students;"
    );
    assert_eq!(result.rows.len(), 1);
    let row = &result.rows[0];
    assert_eq!(row["total_rows"], Value::Int(0));
    for column in ["avg_age", "avg_attendance", "avg_internal", "avg_external"] {
        assert!(row[column].is_null(), "{column} should be null");
    }
    assert_eq!(
        result.explain.as_deref(),
        Some("Aggregated summary of the students table.")
    );
}

#[tokio::test]
async fn test_average_fallback_executes() {
    let (_dir, config) = students_db(SEED_ROWS).await;
    let pipeline = pipeline_with(&config, MockTextGenerator::unavailable());

    let result = pipeline
        .ask("avg external", ExecutionTarget::RelationalDb)
        .await
        .unwrap();

    assert_eq!(
        result.sql,
        "SELECT AVG(external_marks) AS avg_external_marks FROM students;"
    );
    let avg = result.rows[0]["avg_external_marks"].as_f64().unwrap();
    assert!((avg - 340.0 / 6.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_lenient_extraction_end_to_end() {
    let (_dir, config) = students_db(SEED_ROWS).await;
    let mock = MockTextGenerator::new(vec![
        "Sure! Here is the query you asked for:\n{\"sql\": \"SELECT COUNT(DISTINCT student_id) AS students FROM students;\", \"explain\": \"Counts distinct students.\"}\nLet me know if you need more.",
    ]);
    let pipeline = pipeline_with(&config, mock.clone());

    let result = pipeline
        .ask("how many distinct students?", ExecutionTarget::RelationalDb)
        .await
        .unwrap();

    assert_eq!(mock.call_count(), 1);
    assert_eq!(result.rows[0]["students"], Value::Int(3));
    assert_eq!(result.explain.as_deref(), Some("Counts distinct students."));
}

#[tokio::test]
async fn test_retry_fires_exactly_once_then_falls_back() {
    let (_dir, config) = students_db(SEED_ROWS).await;
    let mock = MockTextGenerator::new(vec![
        "SELECT * FROM students",
        "I am sorry, I cannot do that",
        r#"{"sql": "SELECT 'never used';"}"#,
    ]);
    let prompts = mock.prompts();
    let pipeline = pipeline_with(&config, mock.clone());

    let translation = pipeline
        .translate("list a few students", ExecutionTarget::RelationalDb)
        .await
        .unwrap();

    assert_eq!(mock.call_count(), 2);
    assert_eq!(translation.source, TranslationSource::Fallback);
    assert_eq!(translation.sql, "SELECT * FROM students LIMIT 10;");
    assert!(prompts.lock().unwrap()[1].ends_with("nothing else."));
}

#[tokio::test]
async fn test_retry_result_is_executed() {
    let (_dir, config) = students_db(SEED_ROWS).await;
    let mock = MockTextGenerator::new(vec![
        "no json here",
        r#"{"sql": "SELECT name FROM students WHERE student_id = 2;"}"#,
    ]);
    let pipeline = pipeline_with(&config, mock);

    let result = pipeline
        .ask("who is student 2", ExecutionTarget::RelationalDb)
        .await
        .unwrap();

    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0]["name"], Value::from("Ben"));
    assert!(result.explain.is_none());
}

#[tokio::test]
async fn test_fence_only_sql_falls_back() {
    let (_dir, config) = students_db(SEED_ROWS).await;
    let fenced = r#"{"sql": "```sql\n```"}"#;
    let mock = MockTextGenerator::new(vec![fenced, fenced]);
    let pipeline = pipeline_with(&config, mock.clone());

    let result = pipeline
        .ask("anything", ExecutionTarget::RelationalDb)
        .await
        .unwrap();

    assert_eq!(mock.call_count(), 2);
    assert_eq!(result.sql, "SELECT * FROM students LIMIT 10;");
    assert_eq!(result.rows.len(), 6);
}

#[tokio::test]
async fn test_guard_blocks_destructive_model_output() {
    let (_dir, config) = students_db(SEED_ROWS).await;
    let mock = MockTextGenerator::new(vec![
        "```sql\nDROP TABLE students;\n```",
        r#"{"sql": "DROP TABLE students;", "explain": "Removes the table."}"#,
    ]);
    let pipeline = pipeline_with(&config, mock);

    let err = pipeline
        .ask("delete everything", ExecutionTarget::RelationalDb)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "RejectedSQL");
    assert_eq!(err.sql(), Some("DROP TABLE students;"));

    // The table is untouched.
    let check = pipeline_with(&config, MockTextGenerator::unavailable());
    let rows = check
        .ask("count duplicates", ExecutionTarget::RelationalDb)
        .await
        .unwrap()
        .rows;
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_delete_guard_configurable() {
    let (_dir, mut config) = students_db(SEED_ROWS).await;
    let delete = r#"{"sql": "DELETE FROM students WHERE student_id = 2;"}"#;

    let allowed = pipeline_with(&config, MockTextGenerator::new(vec![delete]))
        .ask("remove Ben", ExecutionTarget::RelationalDb)
        .await
        .unwrap();
    assert!(allowed.rows.is_empty());

    config.guard.reject_delete = true;
    let err = pipeline_with(&config, MockTextGenerator::new(vec![delete]))
        .ask("remove Ben", ExecutionTarget::RelationalDb)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "RejectedSQL");
}

#[tokio::test]
async fn test_execution_error_surfaces_sql() {
    let (_dir, config) = students_db(SEED_ROWS).await;
    let mock = MockTextGenerator::new(vec![r#"{"sql": "SELECT grade FROM students;"}"#]);

    let err = pipeline_with(&config, mock)
        .ask("grades", ExecutionTarget::RelationalDb)
        .await
        .unwrap_err();

    let report = err.report();
    assert_eq!(report.kind, "ExecutionError");
    assert_eq!(report.sql.as_deref(), Some("SELECT grade FROM students;"));
    assert!(report.message.contains("grade"));
}

#[tokio::test]
async fn test_offline_pipeline_from_config() {
    let (_dir, config) = students_db(SEED_ROWS).await;
    let pipeline = QueryPipeline::from_config(&config, true).unwrap();

    let result = pipeline
        .ask("show me some rows", ExecutionTarget::RelationalDb)
        .await
        .unwrap();

    assert_eq!(result.sql, "SELECT * FROM students LIMIT 10;");
    assert_eq!(result.rows.len(), 6);
    assert_eq!(result.rows[0]["student_id"], Value::Int(1));
}
