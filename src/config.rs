//! Configuration management for data-agent.
//!
//! Handles loading configuration from TOML files and environment variables.
//! Nothing here is global: the resolved `Config` is passed explicitly into the
//! gateway, translator and executor constructors.

use crate::db::SchemaDescriptor;
use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure for data-agent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Hosted model (gateway) configuration.
    #[serde(default)]
    pub model: ModelConfig,

    /// Warehouse (BigQuery) configuration.
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Relational database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// SQL guard configuration.
    #[serde(default)]
    pub guard: GuardConfig,

    /// Rule-based fallback configuration.
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// The table questions are asked about.
    #[serde(default)]
    pub schema: SchemaDescriptor,
}

/// Hosted text-generation model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model provider: "vertex" or "rules". Unset means "vertex".
    pub provider: Option<String>,

    /// Model identifier (e.g., "gemini-2.5-flash"). Unset means the default model.
    pub model_id: Option<String>,

    /// Cloud project identifier.
    pub project: Option<String>,

    /// Cloud region identifier (e.g., "us-central1").
    pub region: Option<String>,

    /// Pre-issued OAuth access token. Takes precedence over `credentials`.
    pub access_token: Option<String>,

    /// Path to a service-account key file.
    pub credentials: Option<PathBuf>,

    /// Upper bound on generated tokens.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const DEFAULT_PROVIDER: &str = "vertex";

const DEFAULT_MODEL: &str = "gemini-2.5-flash";

fn default_max_output_tokens() -> u32 {
    512
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model_id: None,
            project: None,
            region: None,
            access_token: None,
            credentials: None,
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ModelConfig {
    /// Returns the configured provider, or the default one.
    pub fn provider(&self) -> &str {
        self.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    /// Returns the configured model identifier, or the default model.
    pub fn model_id(&self) -> &str {
        self.model_id.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Warehouse configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WarehouseConfig {
    /// Project the query jobs run under. Defaults to the model project.
    pub project: Option<String>,

    /// Path to a service-account key file. Defaults to the model credentials.
    pub credentials: Option<PathBuf>,
}

/// Relational database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Full connection URL (`mysql://...` or `sqlite://...`). Overrides the fields below.
    pub url: Option<String>,

    /// Instance address as `host[:port]` (e.g. a Cloud SQL Auth Proxy listener).
    pub instance: Option<String>,

    /// Database user.
    pub user: Option<String>,

    /// Database password (not recommended to store in config).
    pub password: Option<String>,

    /// Database name.
    pub database: Option<String>,
}

/// MySQL default port, used when the instance address has none.
const DEFAULT_MYSQL_PORT: u16 = 3306;

impl DatabaseConfig {
    /// Builds the connection URL for the relational backend.
    ///
    /// An explicit `url` wins; otherwise instance, user and database are required.
    pub fn connection_url(&self) -> Result<String> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let instance = self
            .instance
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AgentError::config("Database instance is required (INSTANCE_CONNECTION_NAME)"))?;
        let user = self
            .user
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AgentError::config("Database user is required (DB_USER)"))?;
        let database = self
            .database
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AgentError::config("Database name is required (DB_NAME)"))?;

        if is_cloud_sql_connection_name(instance) {
            return Err(AgentError::config(format!(
                "INSTANCE_CONNECTION_NAME '{instance}' is a Cloud SQL connection name. \
                 Run the Cloud SQL Auth Proxy and set it to the proxy address (host[:port]), \
                 or set DATABASE_URL"
            )));
        }

        let mut url = Url::parse(&format!("mysql://{instance}"))
            .map_err(|e| AgentError::config(format!("Invalid database instance '{instance}': {e}")))?;
        if url.port().is_none() {
            url.set_port(Some(DEFAULT_MYSQL_PORT))
                .map_err(|_| AgentError::config(format!("Invalid database instance '{instance}'")))?;
        }
        url.set_username(user)
            .map_err(|_| AgentError::config("Invalid database user"))?;
        if let Some(password) = &self.password {
            url.set_password(Some(password))
                .map_err(|_| AgentError::config("Invalid database password"))?;
        }
        url.set_path(database);

        Ok(url.to_string())
    }

    /// Returns a display-safe string (no password) for logging.
    pub fn display_string(&self) -> String {
        if let Some(url) = &self.url {
            return match Url::parse(url) {
                Ok(mut parsed) => {
                    let _ = parsed.set_password(None);
                    parsed.to_string()
                }
                Err(_) => "<invalid url>".to_string(),
            };
        }
        let instance = self.instance.as_deref().unwrap_or("unknown");
        let database = self.database.as_deref().unwrap_or("unknown");
        format!("{database} @ {instance}")
    }
}

/// `project:region:instance`, as shown in the Cloud SQL console.
fn is_cloud_sql_connection_name(instance: &str) -> bool {
    !instance.starts_with('[') && instance.split(':').count() == 3
}

/// SQL guard configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GuardConfig {
    /// Also reject statements containing `delete `.
    #[serde(default)]
    pub reject_delete: bool,
}

/// Rule-based fallback configuration.
///
/// The defaults reproduce the canned queries for the built-in `students` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Keyword → column pairs checked in order for average questions.
    #[serde(default = "default_average_keywords")]
    pub average_keywords: Vec<KeywordColumn>,

    /// Column averaged when no keyword matches.
    #[serde(default = "default_average_column")]
    pub default_average_column: String,

    /// Aggregates in the summary query, after `COUNT(*) AS total_rows`.
    #[serde(default = "default_summary")]
    pub summary: Vec<SummaryAggregate>,

    /// Row limit of the sample query.
    #[serde(default = "default_sample_limit")]
    pub sample_limit: u32,
}

/// Maps a question keyword to the column it selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordColumn {
    pub keyword: String,
    pub column: String,
}

/// One `AVG(column) AS alias` term of the summary query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryAggregate {
    pub column: String,
    pub alias: String,
}

fn default_average_keywords() -> Vec<KeywordColumn> {
    vec![
        KeywordColumn {
            keyword: "age".to_string(),
            column: "age".to_string(),
        },
        KeywordColumn {
            keyword: "external".to_string(),
            column: "external_marks".to_string(),
        },
    ]
}

fn default_average_column() -> String {
    "external_marks".to_string()
}

fn default_summary() -> Vec<SummaryAggregate> {
    [
        ("age", "avg_age"),
        ("attendance_percentage", "avg_attendance"),
        ("internal_marks", "avg_internal"),
        ("external_marks", "avg_external"),
    ]
    .into_iter()
    .map(|(column, alias)| SummaryAggregate {
        column: column.to_string(),
        alias: alias.to_string(),
    })
    .collect()
}

fn default_sample_limit() -> u32 {
    10
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            average_keywords: default_average_keywords(),
            default_average_column: default_average_column(),
            summary: default_summary(),
            sample_limit: default_sample_limit(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("data-agent")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AgentError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            AgentError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Applies environment variables as defaults for anything the file left unset.
    pub fn apply_env_defaults(&mut self) {
        self.apply_defaults_from(|key| std::env::var(key).ok());
    }

    /// Applies defaults from an arbitrary variable lookup.
    pub fn apply_defaults_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let model = &mut self.model;
        fill(&mut model.provider, || lookup("MODEL_PROVIDER"));
        fill(&mut model.model_id, || lookup("MODEL_RESOURCE"));
        fill(&mut model.project, || lookup("PROJECT_ID"));
        fill(&mut model.region, || lookup("REGION"));
        fill(&mut model.access_token, || lookup("VERTEX_ACCESS_TOKEN"));
        fill(&mut model.credentials, || {
            lookup("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from)
        });

        fill(&mut self.warehouse.project, || lookup("PROJECT_ID"));
        fill(&mut self.warehouse.credentials, || {
            lookup("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from)
        });

        let database = &mut self.database;
        fill(&mut database.url, || lookup("DATABASE_URL"));
        fill(&mut database.instance, || lookup("INSTANCE_CONNECTION_NAME"));
        fill(&mut database.user, || lookup("DB_USER"));
        fill(&mut database.password, || lookup("DB_PASS"));
        fill(&mut database.database, || lookup("DB_NAME"));
    }
}

fn fill<T>(slot: &mut Option<T>, value: impl FnOnce() -> Option<T>) {
    if slot.is_none() {
        *slot = value();
    }
}
