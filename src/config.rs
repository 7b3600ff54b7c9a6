//! Configuration management for Propsearch
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{PropsearchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Provider types accepted by `provider.type`
pub const VALID_PROVIDERS: [&str; 3] = ["azure", "openai", "ollama"];

/// Main configuration structure for Propsearch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Language-model provider configuration
    pub provider: ProviderConfig,
    /// Listing store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Conversation settings shared by both presentations
    #[serde(default)]
    pub search: SearchConfig,
    /// Form server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Provider configuration
///
/// Specifies which language-model backend to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Sampling temperature sent with every request
    #[serde(default)]
    pub temperature: f32,

    /// HTTP request timeout (seconds)
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,

    /// Azure OpenAI configuration
    #[serde(default)]
    pub azure: AzureConfig,

    /// OpenAI-compatible endpoint configuration
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

fn default_provider_timeout() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: "azure".to_string(),
            temperature: 0.0,
            timeout_seconds: default_provider_timeout(),
            azure: AzureConfig::default(),
            openai: OpenAiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// Azure OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    #[serde(default)]
    pub endpoint: String,

    /// API key sent in the `api-key` header
    #[serde(default)]
    pub api_key: Option<String>,

    /// Deployment name the requests are routed to
    #[serde(default)]
    pub deployment: String,

    /// REST API version
    #[serde(default = "default_azure_api_version")]
    pub api_version: String,
}

fn default_azure_api_version() -> String {
    "2024-06-01".to_string()
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            deployment: String::new(),
            api_version: default_azure_api_version(),
        }
    }
}

/// OpenAI-compatible provider configuration (OpenAI, LiteLLM proxy, vLLM)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL; `/chat/completions` is appended
    #[serde(default = "default_openai_api_base")]
    pub api_base: String,

    /// Bearer token
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_openai_model")]
    pub model: String,
}

fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: default_openai_api_base(),
            api_key: None,
            model: default_openai_model(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }
}

/// Listing store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database directory
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Collection holding the listings
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_store_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "propsearch")
        .map(|dirs| dirs.data_dir().join("listings.db"))
        .unwrap_or_else(|| PathBuf::from("data/listings.db"))
}

fn default_collection() -> String {
    "Recommendation".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            collection: default_collection(),
        }
    }
}

/// Conversation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of turns kept as model context; oldest exchanges go first
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
}

fn default_max_history_turns() -> usize {
    40
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_history_turns: default_max_history_turns(),
        }
    }
}

/// Form server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Most form sessions kept at once; the least recently seen goes first
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Seconds a form session may sit unused before it is discarded
    #[serde(default = "default_session_idle_seconds")]
    pub session_idle_seconds: u64,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8501
}

fn default_max_sessions() -> usize {
    1000
}

fn default_session_idle_seconds() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            max_sessions: default_max_sessions(),
            session_idle_seconds: default_session_idle_seconds(),
        }
    }
}

impl Config {
    /// Load configuration from file, environment variables, and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PropsearchError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| PropsearchError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("PROPSEARCH_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(temperature) = std::env::var("PROPSEARCH_TEMPERATURE") {
            if let Ok(value) = temperature.parse() {
                self.provider.temperature = value;
            } else {
                tracing::warn!("Invalid PROPSEARCH_TEMPERATURE: {}", temperature);
            }
        }

        if let Ok(timeout) = std::env::var("PROPSEARCH_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.provider.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid PROPSEARCH_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        // Azure
        if let Ok(endpoint) = std::env::var("PROPSEARCH_AZURE_ENDPOINT") {
            self.provider.azure.endpoint = endpoint;
        }
        if let Ok(api_key) = std::env::var("PROPSEARCH_AZURE_API_KEY") {
            self.provider.azure.api_key = Some(api_key);
        }
        if let Ok(deployment) = std::env::var("PROPSEARCH_AZURE_DEPLOYMENT") {
            self.provider.azure.deployment = deployment;
        }
        if let Ok(api_version) = std::env::var("PROPSEARCH_AZURE_API_VERSION") {
            self.provider.azure.api_version = api_version;
        }

        // OpenAI-compatible
        if let Ok(api_base) = std::env::var("PROPSEARCH_OPENAI_API_BASE") {
            self.provider.openai.api_base = api_base;
        }
        if let Ok(api_key) = std::env::var("PROPSEARCH_OPENAI_API_KEY") {
            self.provider.openai.api_key = Some(api_key);
        }
        if let Ok(model) = std::env::var("PROPSEARCH_OPENAI_MODEL") {
            self.provider.openai.model = model;
        }

        // Ollama
        if let Ok(host) = std::env::var("PROPSEARCH_OLLAMA_HOST") {
            self.provider.ollama.host = host;
        }
        if let Ok(model) = std::env::var("PROPSEARCH_OLLAMA_MODEL") {
            self.provider.ollama.model = model;
        }

        // Store
        if let Ok(path) = std::env::var("PROPSEARCH_STORE_PATH") {
            self.store.path = PathBuf::from(path);
        }
        if let Ok(collection) = std::env::var("PROPSEARCH_COLLECTION") {
            self.store.collection = collection;
        }

        // Conversation
        if let Ok(max_turns) = std::env::var("PROPSEARCH_MAX_HISTORY_TURNS") {
            if let Ok(value) = max_turns.parse() {
                self.search.max_history_turns = value;
            } else {
                tracing::warn!("Invalid PROPSEARCH_MAX_HISTORY_TURNS: {}", max_turns);
            }
        }

        // Server
        if let Ok(host) = std::env::var("PROPSEARCH_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PROPSEARCH_SERVER_PORT") {
            if let Ok(value) = port.parse() {
                self.server.port = value;
            } else {
                tracing::warn!("Invalid PROPSEARCH_SERVER_PORT: {}", port);
            }
        }
        if let Ok(max_sessions) = std::env::var("PROPSEARCH_MAX_SESSIONS") {
            if let Ok(value) = max_sessions.parse() {
                self.server.max_sessions = value;
            } else {
                tracing::warn!("Invalid PROPSEARCH_MAX_SESSIONS: {}", max_sessions);
            }
        }
        if let Ok(idle) = std::env::var("PROPSEARCH_SESSION_IDLE_SECONDS") {
            if let Ok(value) = idle.parse() {
                self.server.session_idle_seconds = value;
            } else {
                tracing::warn!("Invalid PROPSEARCH_SESSION_IDLE_SECONDS: {}", idle);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(provider) = &cli.provider {
            tracing::debug!("Provider override from CLI: {}", provider);
            self.provider.provider_type = provider.clone();
        }
        if let Some(store) = &cli.store {
            tracing::debug!("Store path override from CLI: {}", store.display());
            self.store.path = store.clone();
        }
    }

    /// Validate the settings every command relies on
    ///
    /// Provider settings are checked separately by
    /// [`Config::validate_provider`], so commands that never call the model
    /// run without credentials.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.store.collection.is_empty() {
            return Err(
                PropsearchError::Config("store.collection cannot be empty".to_string()).into(),
            );
        }

        if self.search.max_history_turns == 0 {
            return Err(PropsearchError::Config(
                "search.max_history_turns must be greater than 0".to_string(),
            )
            .into());
        }

        if self.server.max_sessions == 0 {
            return Err(PropsearchError::Config(
                "server.max_sessions must be greater than 0".to_string(),
            )
            .into());
        }

        if self.server.session_idle_seconds == 0 {
            return Err(PropsearchError::Config(
                "server.session_idle_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Validate the selected language-model provider
    ///
    /// Credentials and URLs are only checked for the selected provider, so a
    /// config may carry half-filled sections for backends it does not use.
    ///
    /// # Errors
    ///
    /// Returns error if the provider type is unknown, a setting is out of
    /// range, or the provider's URL or credentials are missing
    pub fn validate_provider(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(PropsearchError::Config("Provider type cannot be empty".to_string()).into());
        }

        if !VALID_PROVIDERS.contains(&self.provider.provider_type.as_str()) {
            return Err(PropsearchError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                VALID_PROVIDERS.join(", ")
            ))
            .into());
        }

        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(PropsearchError::Config(
                "provider.temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        if self.provider.timeout_seconds == 0 {
            return Err(PropsearchError::Config(
                "provider.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        match self.provider.provider_type.as_str() {
            "azure" => {
                let azure = &self.provider.azure;
                validate_url("provider.azure.endpoint", &azure.endpoint)?;
                if azure.deployment.is_empty() {
                    return Err(PropsearchError::Config(
                        "provider.azure.deployment cannot be empty".to_string(),
                    )
                    .into());
                }
                if azure.api_version.is_empty() {
                    return Err(PropsearchError::Config(
                        "provider.azure.api_version cannot be empty".to_string(),
                    )
                    .into());
                }
                if azure.api_key.as_deref().map_or(true, str::is_empty) {
                    return Err(PropsearchError::MissingCredentials("azure".to_string()).into());
                }
            }
            "openai" => {
                let openai = &self.provider.openai;
                validate_url("provider.openai.api_base", &openai.api_base)?;
                if openai.model.is_empty() {
                    return Err(PropsearchError::Config(
                        "provider.openai.model cannot be empty".to_string(),
                    )
                    .into());
                }
                if openai.api_key.as_deref().map_or(true, str::is_empty) {
                    return Err(PropsearchError::MissingCredentials("openai".to_string()).into());
                }
            }
            "ollama" => {
                validate_url("provider.ollama.host", &self.provider.ollama.host)?;
                if self.provider.ollama.model.is_empty() {
                    return Err(PropsearchError::Config(
                        "provider.ollama.model cannot be empty".to_string(),
                    )
                    .into());
                }
            }
            _ => {}
        }

        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(PropsearchError::Config(format!("{} cannot be empty", field)).into());
    }
    let parsed = url::Url::parse(value)
        .map_err(|e| PropsearchError::Config(format!("{} is not a valid URL: {}", field, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PropsearchError::Config(format!(
            "{} must use http or https, got {}",
            field,
            parsed.scheme()
        ))
        .into());
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            store: StoreConfig::default(),
            search: SearchConfig::default(),
            server: ServerConfig::default(),
        }
    }
}
