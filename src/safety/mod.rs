//! SQL guard.
//!
//! A coarse textual denylist applied before execution. Markdown code fences
//! are stripped, then the statement is searched case-insensitively for
//! destructive keywords. No parsing is involved, so a keyword inside a string
//! literal is still rejected and a keyword hidden behind a comment is not.

use crate::config::GuardConfig;
use crate::error::{AgentError, Result};
use std::fmt;

/// Keywords rejected by default. The trailing space is part of the match.
const DEFAULT_DENYLIST: [&str; 3] = ["drop ", "truncate ", "alter "];

/// Added to the denylist when `guard.reject_delete` is set.
const DELETE_KEYWORD: &str = "delete ";

/// Reason reported for every rejection.
const REJECTION_REASON: &str = "destructive statement detected";

/// Outcome of validating a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    /// The fence-stripped, trimmed statement, safe to execute.
    Approved(String),
    /// The statement matched the denylist.
    Rejected {
        reason: String,
        keyword: String,
        sql: String,
    },
}

impl GuardVerdict {
    /// Returns true if the statement was approved.
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved(_))
    }

    /// Converts the verdict into the approved SQL or a `RejectedSql` error.
    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Approved(sql) => Ok(sql),
            Self::Rejected { reason, sql, .. } => Err(AgentError::rejected(reason, sql)),
        }
    }
}

impl fmt::Display for GuardVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved(_) => write!(f, "Approved"),
            Self::Rejected { keyword, .. } => write!(f, "Rejected ({})", keyword.trim()),
        }
    }
}

/// Denylist-based statement validator.
#[derive(Debug, Clone)]
pub struct SqlGuard {
    denylist: Vec<&'static str>,
}

impl SqlGuard {
    /// Creates a guard with the default denylist.
    pub fn new() -> Self {
        Self {
            denylist: DEFAULT_DENYLIST.to_vec(),
        }
    }

    /// Creates a guard that also rejects `delete `.
    pub fn with_delete_rejected() -> Self {
        let mut guard = Self::new();
        guard.denylist.push(DELETE_KEYWORD);
        guard
    }

    /// Creates a guard from the `[guard]` section.
    pub fn from_config(config: &GuardConfig) -> Self {
        if config.reject_delete {
            Self::with_delete_rejected()
        } else {
            Self::new()
        }
    }

    /// Returns the active denylist.
    pub fn denylist(&self) -> &[&'static str] {
        &self.denylist
    }

    /// Validates a statement.
    pub fn validate(&self, sql: &str) -> GuardVerdict {
        let cleaned = strip_code_fences(sql);
        let lowered = cleaned.to_lowercase();

        match self.denylist.iter().find(|kw| lowered.contains(*kw)) {
            Some(keyword) => GuardVerdict::Rejected {
                reason: REJECTION_REASON.to_string(),
                keyword: keyword.to_string(),
                sql: cleaned,
            },
            None => GuardVerdict::Approved(cleaned),
        }
    }
}

impl Default for SqlGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes every `` ```sql `` and `` ``` `` marker and trims the result.
pub fn strip_code_fences(sql: &str) -> String {
    sql.replace("```sql", "").replace("```", "").trim().to_string()
}
