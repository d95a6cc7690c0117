//! Translation request and result types.

use crate::error::{AgentError, Result};
use serde::Serialize;
use std::fmt;

/// A natural-language question awaiting translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    question: String,
}

impl TranslationRequest {
    /// Creates a request, rejecting empty or whitespace-only questions.
    pub fn new(question: impl Into<String>) -> Result<Self> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(AgentError::invalid_request("Missing question"));
        }
        Ok(Self { question })
    }

    /// Returns the question as given.
    pub fn question(&self) -> &str {
        &self.question
    }
}

/// Where a translation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationSource {
    /// Parsed from the first model response.
    Model,
    /// Parsed from the single stricter retry.
    ModelRetry,
    /// Produced by the rule-based generator.
    Fallback,
}

impl TranslationSource {
    /// Returns the source as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::ModelRetry => "model_retry",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for TranslationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL produced for a question, with an optional one-sentence explanation.
///
/// `sql` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationResult {
    pub sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<String>,
    pub source: TranslationSource,
}

impl TranslationResult {
    /// Creates a result from the given parts.
    pub fn new(
        sql: impl Into<String>,
        explain: Option<String>,
        source: TranslationSource,
    ) -> Self {
        Self {
            sql: sql.into(),
            explain,
            source,
        }
    }
}
