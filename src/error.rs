//! Error types for data-agent.
//!
//! Defines the main error enum used throughout the pipeline and the
//! serializable error object handed back to callers.

use serde::Serialize;
use thiserror::Error;

/// Main error type for data-agent operations.
///
/// Translation-stage failures (`Gateway`) are absorbed by the translator's
/// degrade chain; only configuration, request, guard and execution errors
/// reach the caller.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Missing or invalid configuration (project, region, credentials, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The incoming request is unusable (e.g. an empty question).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The hosted text-generation call failed (transport, auth, service).
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// The generated SQL was rejected by the guard.
    #[error("Rejected SQL: {reason}")]
    RejectedSql { reason: String, sql: String },

    /// The backend failed to execute the statement.
    #[error("Execution error: {message}")]
    Execution { sql: String, message: String },
}

impl AgentError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an invalid request error with the given message.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Creates a gateway error with the given message.
    pub fn gateway(msg: impl Into<String>) -> Self {
        Self::Gateway(msg.into())
    }

    /// Creates a guard rejection carrying the offending SQL.
    pub fn rejected(reason: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::RejectedSql {
            reason: reason.into(),
            sql: sql.into(),
        }
    }

    /// Creates an execution error carrying the original SQL.
    pub fn execution(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            sql: sql.into(),
            message: message.into(),
        }
    }

    /// Returns the caller-facing error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigurationError",
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::Gateway(_) => "GatewayError",
            Self::RejectedSql { .. } => "RejectedSQL",
            Self::Execution { .. } => "ExecutionError",
        }
    }

    /// Returns the SQL associated with this error, if one was generated.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::RejectedSql { sql, .. } | Self::Execution { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// Converts the error into the object presented to callers.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
            sql: self.sql().map(String::from),
        }
    }
}

/// Caller-facing error object: `{kind, message, sql?}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

/// Result type alias using AgentError.
pub type Result<T> = std::result::Result<T, AgentError>;
