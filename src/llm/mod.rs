//! Model integration for data-agent.
//!
//! Provides the text-generation seam, the hosted model client, prompt
//! construction, response parsing and the rule-based fallback.

pub mod factory;
pub mod fallback;
pub mod mock;
pub mod parser;
pub mod prompt;
pub mod types;
pub mod vertex;

pub use factory::create_generator;
pub use fallback::FallbackGenerator;
pub use mock::MockTextGenerator;
pub use parser::{parse_response, ParsedResponse};
pub use prompt::PromptBuilder;
pub use types::{TranslationRequest, TranslationResult, TranslationSource};
pub use vertex::{VertexClient, VertexConfig};

use async_trait::async_trait;
use std::str::FromStr;

use crate::error::Result;

/// Trait for hosted models that turn a prompt into text.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends one prompt and returns the model's raw text.
    ///
    /// Failures (transport, authentication, service) are `AgentError::Gateway`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Model provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelProvider {
    /// Vertex AI generative models (Gemini).
    #[default]
    Vertex,
    /// No hosted model; every question goes to the rule-based fallback.
    Rules,
}

impl ModelProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Rules => "rules",
        }
    }
}

impl FromStr for ModelProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vertex" | "vertexai" | "gemini" => Ok(Self::Vertex),
            "rules" | "offline" | "none" => Ok(Self::Rules),
            _ => Err(format!("Unknown model provider: {}", s)),
        }
    }
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
