//! Azure OpenAI provider implementation for Propsearch
//!
//! Requests are routed to a named deployment rather than a model id; the
//! deployment decides which model answers.

use crate::config::AzureConfig;
use crate::error::{PropsearchError, Result};
use crate::providers::openai::{build_client, send_chat_request, ChatCompletionRequest};
use crate::providers::{CompletionOptions, CompletionResponse, Message, Provider};

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Azure OpenAI chat-completions provider
///
/// # Examples
///
/// ```
/// use propsearch::config::AzureConfig;
/// use propsearch::providers::{AzureOpenAiProvider, Provider};
///
/// let config = AzureConfig {
///     endpoint: "https://my-resource.openai.azure.com".to_string(),
///     api_key: Some("key".to_string()),
///     deployment: "gpt-4o".to_string(),
///     api_version: "2024-06-01".to_string(),
/// };
/// let provider = AzureOpenAiProvider::new(config, 120).unwrap();
/// assert_eq!(provider.model(), "gpt-4o");
/// ```
pub struct AzureOpenAiProvider {
    client: Client,
    config: AzureConfig,
}

impl AzureOpenAiProvider {
    /// Create a new Azure OpenAI provider
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: AzureConfig, timeout_seconds: u64) -> Result<Self> {
        let client = build_client(timeout_seconds)?;

        tracing::info!(
            "Initialized Azure OpenAI provider: endpoint={}, deployment={}",
            config.endpoint,
            config.deployment
        );

        Ok(Self { client, config })
    }

    /// Deployment endpoint with the API version as a query parameter
    ///
    /// The deployment name is a single path segment and is percent-encoded.
    fn completions_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.config.endpoint).map_err(|e| {
            PropsearchError::Config(format!("Invalid Azure endpoint: {}", e))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                PropsearchError::Config(format!(
                    "Azure endpoint cannot be a base: {}",
                    self.config.endpoint
                ))
            })?
            .pop_if_empty()
            .extend([
                "openai",
                "deployments",
                self.config.deployment.as_str(),
                "chat",
                "completions",
            ]);
        url.query_pairs_mut()
            .append_pair("api-version", &self.config.api_version);

        Ok(url)
    }
}

#[async_trait]
impl Provider for AzureOpenAiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        let body = ChatCompletionRequest {
            model: None,
            messages,
            temperature: options.temperature,
        };

        let mut request = self.client.post(self.completions_url()?);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("api-key", api_key);
        }

        send_chat_request(request, &body, self.name()).await
    }

    fn name(&self) -> &str {
        "azure"
    }

    fn model(&self) -> &str {
        &self.config.deployment
    }
}
