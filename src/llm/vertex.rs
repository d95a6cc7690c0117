//! Vertex AI model client.
//!
//! Implements the TextGenerator trait for the Vertex AI `generateContent`
//! endpoint (Gemini models).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::config::ModelConfig;
use crate::error::{AgentError, Result};
use crate::llm::TextGenerator;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default upper bound on generated tokens.
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 512;

/// OAuth scope required by Vertex AI.
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Vertex AI client configuration.
#[derive(Debug, Clone)]
pub struct VertexConfig {
    /// Cloud project identifier.
    pub project: String,
    /// Cloud region identifier (e.g., "us-central1").
    pub region: String,
    /// Model to use (e.g., "gemini-2.5-flash").
    pub model: String,
    /// Pre-issued OAuth access token.
    pub access_token: Option<String>,
    /// Service-account key used to mint tokens when no access token is given.
    pub credentials: Option<PathBuf>,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl VertexConfig {
    /// Creates a new config for the given project, region and model.
    pub fn new(
        project: impl Into<String>,
        region: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            region: region.into(),
            model: model.into(),
            access_token: None,
            credentials: None,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Builds a config from the `[model]` section.
    ///
    /// Project and region are mandatory; their absence is a configuration error.
    pub fn from_model_config(config: &ModelConfig) -> Result<Self> {
        let project = config
            .project
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AgentError::config("Model project is required (PROJECT_ID)"))?;
        let region = config
            .region
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AgentError::config("Model region is required (REGION)"))?;

        let mut vertex = Self::new(project, region, config.model_id())
            .with_max_output_tokens(config.max_output_tokens)
            .with_timeout(config.timeout_secs);
        if let Some(token) = config.access_token.as_deref().filter(|t| !t.is_empty()) {
            vertex = vertex.with_access_token(token);
        }
        vertex.credentials = config.credentials.clone();
        Ok(vertex)
    }

    /// Sets a pre-issued access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the upper bound on generated tokens.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Returns the `generateContent` URL for this project, region and model.
    pub fn endpoint(&self) -> String {
        format!(
            "https://{region}-aiplatform.googleapis.com/v1/projects/{project}/locations/{region}/publishers/google/models/{model}:generateContent",
            region = self.region,
            project = self.project,
            model = self.model,
        )
    }
}

/// Vertex AI model client.
#[derive(Debug, Clone)]
pub struct VertexClient {
    config: VertexConfig,
    client: Client,
}

impl VertexClient {
    /// Creates a new Vertex client with the given configuration.
    pub fn new(config: VertexConfig) -> Result<Self> {
        if config.project.is_empty() || config.region.is_empty() {
            return Err(AgentError::config(
                "PROJECT_ID and REGION must be set for the model gateway",
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Resolves a bearer token: the configured token, or one minted from the
    /// service-account key.
    async fn bearer_token(&self) -> Result<String> {
        if let Some(token) = &self.config.access_token {
            return Ok(token.clone());
        }

        let path = self.config.credentials.as_ref().ok_or_else(|| {
            AgentError::gateway(
                "No credentials configured. Set VERTEX_ACCESS_TOKEN or GOOGLE_APPLICATION_CREDENTIALS.",
            )
        })?;

        let key = yup_oauth2::read_service_account_key(path)
            .await
            .map_err(|e| {
                AgentError::gateway(format!(
                    "Failed to read service account key {}: {}",
                    path.display(),
                    e
                ))
            })?;
        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|e| AgentError::gateway(format!("Failed to create authenticator: {}", e)))?;
        let token = auth
            .token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(|e| AgentError::gateway(format!("Failed to obtain access token: {}", e)))?;

        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| AgentError::gateway("Authenticator returned an empty access token"))
    }

    fn build_request(&self, prompt: &str) -> VertexRequest {
        VertexRequest {
            contents: vec![VertexContent {
                role: Some("user".to_string()),
                parts: vec![VertexPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: VertexGenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }

    /// Parses an API error response.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> AgentError {
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return AgentError::gateway(
                "Authentication failed. Check VERTEX_ACCESS_TOKEN or GOOGLE_APPLICATION_CREDENTIALS.",
            );
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return AgentError::gateway("Rate limited. Please wait and try again.");
        }

        if let Ok(error_response) = serde_json::from_str::<VertexErrorResponse>(body) {
            return AgentError::gateway(format!(
                "Vertex AI error: {}",
                error_response.error.message
            ));
        }

        AgentError::gateway(format!("Vertex AI error ({}): {}", status, body))
    }

    /// Concatenates the text parts of the first candidate.
    fn extract_text(response: VertexResponse) -> Result<String> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::gateway("No response from Vertex AI"))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AgentError::gateway("Vertex AI returned an empty response"));
        }
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for VertexClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let token = self.bearer_token().await?;
        let request = self.build_request(prompt);

        debug!(
            "Vertex AI request to model {} in {}",
            self.config.model, self.config.region
        );

        let response = self
            .client
            .post(self.config.endpoint())
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AgentError::gateway("Request timed out. Try again.")
                } else if e.is_connect() {
                    AgentError::gateway("Failed to connect to Vertex AI. Check your network.")
                } else {
                    AgentError::gateway(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AgentError::gateway(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        let response: VertexResponse = serde_json::from_str(&body)
            .map_err(|e| AgentError::gateway(format!("Failed to parse response: {}", e)))?;

        Self::extract_text(response)
    }
}

// Vertex AI API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VertexRequest {
    contents: Vec<VertexContent>,
    generation_config: VertexGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct VertexContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<VertexPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct VertexPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VertexGenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct VertexResponse {
    #[serde(default)]
    candidates: Vec<VertexCandidate>,
}

#[derive(Debug, Deserialize)]
struct VertexCandidate {
    content: Option<VertexContent>,
}

#[derive(Debug, Deserialize)]
struct VertexErrorResponse {
    error: VertexError,
}

#[derive(Debug, Deserialize)]
struct VertexError {
    message: String,
}
