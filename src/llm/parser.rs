//! Response parsing for model outputs.
//!
//! Extracts `{"sql": ..., "explain": ...}` from raw model text. The whole
//! text is tried as JSON first; failing that, the span from the first `{`
//! to the last `}` is tried.

use crate::safety::strip_code_fences;
use serde_json::Value as JsonValue;

/// Result of parsing a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    /// A JSON object with a non-empty `sql` string.
    Sql {
        sql: String,
        explain: Option<String>,
    },
    /// Nothing usable was found; carries a short reason for logging.
    Malformed(String),
}

impl ParsedResponse {
    /// Returns true if the response yielded SQL.
    pub fn is_sql(&self) -> bool {
        matches!(self, Self::Sql { .. })
    }
}

/// Parses a model response.
///
/// A response counts as usable only when it decodes to a JSON object whose
/// `sql` member is a non-empty string once code fences are removed. A
/// non-string `explain` is dropped.
pub fn parse_response(response: &str) -> ParsedResponse {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return ParsedResponse::Malformed("empty response".to_string());
    }

    if let Some(parsed) = parse_object(trimmed) {
        return parsed;
    }

    match extract_braced(trimmed) {
        Some(candidate) => parse_object(candidate).unwrap_or_else(|| {
            ParsedResponse::Malformed("no JSON object with a non-empty sql member".to_string())
        }),
        None => ParsedResponse::Malformed("no JSON object in response".to_string()),
    }
}

/// Decodes `text` as a JSON object carrying SQL.
fn parse_object(text: &str) -> Option<ParsedResponse> {
    let value: JsonValue = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;

    let sql = object
        .get("sql")
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !strip_code_fences(s).is_empty())?;

    let explain = object
        .get("explain")
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Some(ParsedResponse::Sql {
        sql: sql.to_string(),
        explain,
    })
}

/// Returns the span from the first `{` to the last `}`, inclusive.
fn extract_braced(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
