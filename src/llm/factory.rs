//! Text generator factory.
//!
//! Centralizes provider-specific logic for creating the model gateway.

use crate::config::ModelConfig;
use crate::error::{AgentError, Result};
use crate::llm::{ModelProvider, TextGenerator, VertexClient, VertexConfig};

/// Creates the text generator configured in the `[model]` section.
///
/// Returns `None` for the `rules` provider, meaning every question is
/// answered by the rule-based fallback. Missing project or region for a
/// hosted provider is a configuration error.
pub fn create_generator(config: &ModelConfig) -> Result<Option<Box<dyn TextGenerator>>> {
    let provider: ModelProvider = config.provider().parse().map_err(AgentError::config)?;

    match provider {
        ModelProvider::Vertex => {
            let vertex = VertexConfig::from_model_config(config)?;
            Ok(Some(Box::new(VertexClient::new(vertex)?)))
        }
        ModelProvider::Rules => Ok(None),
    }
}
