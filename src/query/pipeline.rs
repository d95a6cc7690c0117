//! Question-to-rows pipeline.
//!
//! Wires the translator, the guard and the executor together behind the two
//! caller-facing operations: SQL preview and full execution.

use serde::Serialize;

use crate::config::Config;
use crate::db::{ExecutionTarget, Row};
use crate::error::Result;
use crate::llm::{create_generator, TranslationRequest, TranslationResult};
use crate::query::{SqlExecutor, Translator};
use crate::safety::{GuardVerdict, SqlGuard};

/// Successful answer to a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    /// The statement that was executed, after guard cleanup.
    pub sql: String,
    /// Result rows keyed by column name.
    pub rows: Vec<Row>,
    /// One-sentence explanation, when the translation provided one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<String>,
}

/// Translates questions, validates the SQL and executes it.
pub struct QueryPipeline {
    translator: Translator,
    guard: SqlGuard,
    executor: SqlExecutor,
}

impl QueryPipeline {
    /// Creates a pipeline from its parts.
    pub fn new(translator: Translator, guard: SqlGuard, executor: SqlExecutor) -> Self {
        Self {
            translator,
            guard,
            executor,
        }
    }

    /// Creates a pipeline from the resolved configuration.
    ///
    /// With `offline` set no model gateway is built and every question is
    /// answered by the rule-based generator. A hosted provider without project
    /// or region is a configuration error.
    pub fn from_config(config: &Config, offline: bool) -> Result<Self> {
        let generator = if offline {
            None
        } else {
            create_generator(&config.model)?
        };

        Ok(Self::new(
            Translator::from_config(config, generator),
            SqlGuard::from_config(&config.guard),
            SqlExecutor::from_config(config),
        ))
    }

    /// Translates a question without executing it.
    pub async fn translate(
        &self,
        question: &str,
        target: ExecutionTarget,
    ) -> Result<TranslationResult> {
        let request = TranslationRequest::new(question)?;
        Ok(self.translator.translate(&request, target).await)
    }

    /// Answers a question: translate, validate, execute.
    ///
    /// Only request validation, guard rejection and execution failures are
    /// returned as errors.
    pub async fn ask(&self, question: &str, target: ExecutionTarget) -> Result<ExecutionResult> {
        let translation = self.translate(question, target).await?;

        let verdict = self.guard.validate(&translation.sql);
        if let GuardVerdict::Rejected { keyword, .. } = &verdict {
            tracing::warn!(keyword = %keyword.trim(), sql = %translation.sql, "Guard rejected SQL");
        }
        let sql = verdict.into_result()?;

        let rows = self.executor.execute(&sql, target).await?;

        Ok(ExecutionResult {
            sql,
            rows,
            explain: translation.explain,
        })
    }
}
