//! Rule-based SQL generation.
//!
//! Keyword-driven templates used when the hosted model is unavailable or its
//! output is unusable. Never fails and never touches an external resource.

use crate::config::{FallbackConfig, KeywordColumn, SummaryAggregate};
use crate::db::{Column, SchemaDescriptor};
use crate::llm::types::{TranslationResult, TranslationSource};
use tracing::warn;

/// Deterministic keyword-to-SQL generator for one table.
///
/// Rules naming columns the table does not have are dropped at construction,
/// so every template only references declared columns.
#[derive(Debug, Clone)]
pub struct FallbackGenerator {
    schema: SchemaDescriptor,
    average_keywords: Vec<KeywordColumn>,
    average_column: Option<String>,
    summary: Vec<SummaryAggregate>,
    sample_limit: u32,
}

impl FallbackGenerator {
    /// Creates a generator for the given schema and rules.
    ///
    /// Average and summary columns missing from the schema are replaced by the
    /// schema's own numeric columns.
    pub fn new(schema: SchemaDescriptor, config: FallbackConfig) -> Self {
        let average_keywords: Vec<KeywordColumn> = config
            .average_keywords
            .into_iter()
            .filter(|k| known_column(&schema, &k.column))
            .collect();

        let average_column = if schema.has_column(&config.default_average_column) {
            Some(config.default_average_column)
        } else {
            warn!(
                column = %config.default_average_column,
                table = %schema.table_name,
                "Default average column not in schema"
            );
            numeric_columns(&schema).next().map(|c| c.name.clone())
        };

        let configured = config.summary.len();
        let mut summary: Vec<SummaryAggregate> = config
            .summary
            .into_iter()
            .filter(|a| known_column(&schema, &a.column))
            .collect();
        if configured > 0 && summary.is_empty() {
            summary = numeric_columns(&schema)
                .map(|c| SummaryAggregate {
                    column: c.name.clone(),
                    alias: format!("avg_{}", c.name),
                })
                .collect();
        }

        Self {
            schema,
            average_keywords,
            average_column,
            summary,
            sample_limit: config.sample_limit,
        }
    }

    /// Produces SQL for `question`.
    ///
    /// Rules are tried in order: duplicates, average/avg, summary/overview,
    /// then a bounded sample.
    pub fn generate(&self, question: &str) -> TranslationResult {
        let q = question.to_lowercase();

        let (sql, explain) = if q.contains("duplicate") {
            self.duplicates()
        } else if q.contains("average") || q.contains("avg") {
            self.average(&q)
        } else if q.contains("summary") || q.contains("overview") {
            self.summary()
        } else {
            self.sample()
        };

        TranslationResult::new(sql, Some(explain), TranslationSource::Fallback)
    }

    /// Rows identical across all non-key columns, with their multiplicity.
    ///
    /// A table whose columns are all keys groups by every column instead.
    fn duplicates(&self) -> (String, String) {
        let mut columns: Vec<&str> = self
            .schema
            .non_key_columns()
            .map(|c| c.name.as_str())
            .collect();
        if columns.is_empty() {
            columns = self.schema.columns.iter().map(|c| c.name.as_str()).collect();
        }
        if columns.is_empty() {
            return self.sample();
        }
        let columns = columns.join(", ");

        (
            format!(
                "SELECT {columns}, COUNT(*) AS duplicate_count FROM {table} GROUP BY {columns} HAVING COUNT(*) > 1;",
                table = self.schema.table_name,
            ),
            "Find rows that are identical across all non-primary columns.".to_string(),
        )
    }

    /// Average of the first column whose keyword occurs in the question.
    ///
    /// Matching is a plain substring check, so "average" itself selects the
    /// `age` column under the default rules. Without any numeric column the
    /// question gets the row count.
    fn average(&self, question: &str) -> (String, String) {
        let column = self
            .average_keywords
            .iter()
            .find(|k| question.contains(&k.keyword.to_lowercase()))
            .map(|k| k.column.as_str())
            .or(self.average_column.as_deref());

        match column {
            Some(column) => (
                format!(
                    "SELECT AVG({column}) AS avg_{column} FROM {table};",
                    table = self.schema.table_name,
                ),
                format!("Average of {column}."),
            ),
            None => (
                format!(
                    "SELECT COUNT(*) AS total_rows FROM {};",
                    self.schema.table_name
                ),
                format!("No numeric column in {}; counting rows.", self.schema.table_name),
            ),
        }
    }

    fn summary(&self) -> (String, String) {
        let mut terms = vec!["COUNT(*) AS total_rows".to_string()];
        terms.extend(
            self.summary
                .iter()
                .map(|a| format!("AVG({}) AS {}", a.column, a.alias)),
        );

        (
            format!(
                "SELECT {} FROM {};",
                terms.join(", "),
                self.schema.table_name
            ),
            format!("Aggregated summary of the {} table.", self.schema.table_name),
        )
    }

    fn sample(&self) -> (String, String) {
        (
            format!(
                "SELECT * FROM {} LIMIT {};",
                self.schema.table_name, self.sample_limit
            ),
            "Fallback: sample rows.".to_string(),
        )
    }
}

fn known_column(schema: &SchemaDescriptor, column: &str) -> bool {
    let known = schema.has_column(column);
    if !known {
        warn!(column, table = %schema.table_name, "Fallback rule column not in schema, skipping");
    }
    known
}

/// Non-key numeric columns, the candidates for averaging.
fn numeric_columns(schema: &SchemaDescriptor) -> impl Iterator<Item = &Column> {
    schema.non_key_columns().filter(|c| c.data_type.is_numeric())
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new(SchemaDescriptor::students(), FallbackConfig::default())
    }
}
