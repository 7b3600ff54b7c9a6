//! OpenAI-compatible provider implementation for Propsearch
//!
//! Talks to any endpoint that speaks the chat-completions protocol: OpenAI
//! itself, a LiteLLM proxy, vLLM and similar gateways. The request/response
//! wire types are shared with the Azure OpenAI provider.

use crate::config::OpenAiConfig;
use crate::error::{PropsearchError, Result};
use crate::providers::{CompletionOptions, CompletionResponse, Message, Provider, TokenUsage};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request body for `/chat/completions`
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: &'a [Message],
    pub temperature: f32,
}

/// Response body from `/chat/completions`
#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: usize,
    #[serde(default)]
    pub completion_tokens: usize,
}

impl ChatCompletionResponse {
    /// Take the first choice's text, mapping a missing one to a provider error
    pub(crate) fn into_completion(self, provider: &str) -> Result<CompletionResponse> {
        let usage = self
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));

        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                PropsearchError::Provider(format!("{} returned no message content", provider))
            })?;

        Ok(match usage {
            Some(usage) => CompletionResponse::with_usage(content, usage),
            None => CompletionResponse::new(content),
        })
    }
}

/// Build the shared HTTP client used by the chat-completions providers
pub(crate) fn build_client(timeout_seconds: u64) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("propsearch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PropsearchError::Provider(format!("Failed to create HTTP client: {}", e)))?;
    Ok(client)
}

/// Send a chat-completions request and decode the reply
pub(crate) async fn send_chat_request(
    request: reqwest::RequestBuilder,
    body: &ChatCompletionRequest<'_>,
    provider: &str,
) -> Result<CompletionResponse> {
    tracing::debug!(
        "Sending {} request: {} messages, temperature={}",
        provider,
        body.messages.len(),
        body.temperature
    );

    let response = request.json(body).send().await.map_err(|e| {
        tracing::error!("{} request failed: {}", provider, e);
        PropsearchError::Provider(format!("{} request failed: {}", provider, e))
    })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!("{} returned error {}: {}", provider, status, error_text);
        return Err(PropsearchError::Provider(format!(
            "{} returned error {}: {}",
            provider, status, error_text
        ))
        .into());
    }

    let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
        tracing::error!("Failed to parse {} response: {}", provider, e);
        PropsearchError::Provider(format!("Failed to parse {} response: {}", provider, e))
    })?;

    parsed.into_completion(provider)
}

/// OpenAI-compatible chat-completions provider
///
/// # Examples
///
/// ```
/// use propsearch::config::OpenAiConfig;
/// use propsearch::providers::{OpenAiProvider, Provider};
///
/// let config = OpenAiConfig {
///     api_base: "http://localhost:4000".to_string(),
///     api_key: Some("sk-litellm".to_string()),
///     model: "azure/gpt-4o".to_string(),
/// };
/// let provider = OpenAiProvider::new(config, 120).unwrap();
/// assert_eq!(provider.model(), "azure/gpt-4o");
/// ```
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create a new OpenAI-compatible provider
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: OpenAiConfig, timeout_seconds: u64) -> Result<Self> {
        let client = build_client(timeout_seconds)?;

        tracing::info!(
            "Initialized OpenAI-compatible provider: api_base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        let body = ChatCompletionRequest {
            model: Some(&self.config.model),
            messages,
            temperature: options.temperature,
        };

        let mut request = self.client.post(self.completions_url());
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        send_chat_request(request, &body, self.name()).await
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
