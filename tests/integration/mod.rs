//! Integration tests for data-agent.
//!
//! Shared helpers for seeding a SQLite `students` table.

pub mod config_test;
pub mod pipeline_test;
pub mod relational_test;
pub mod warehouse_test;

use data_agent::config::Config;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use std::path::Path;

/// DDL for the built-in students table.
pub const STUDENTS_DDL: &str = "CREATE TABLE students (
    student_id INTEGER,
    name TEXT,
    age INTEGER,
    department TEXT,
    attendance_percentage INTEGER,
    internal_marks INTEGER,
    external_marks INTEGER
);";

/// Creates a SQLite database at `path` and runs `seed` against it.
pub async fn seed_sqlite(path: &Path, seed: &str) {
    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await
        .unwrap();
    sqlx::raw_sql(seed).execute(&mut conn).await.unwrap();
    conn.close().await.unwrap();
}

/// Returns a config pointing the relational backend at the SQLite file.
pub fn sqlite_config(path: &Path) -> Config {
    let mut config = Config::default();
    config.database.url = Some(format!("sqlite://{}", path.display()));
    config
}
