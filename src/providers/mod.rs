//! Provider module for Propsearch
//!
//! This module contains the language-model provider abstraction and the
//! Azure OpenAI, OpenAI-compatible and Ollama implementations.

pub mod azure;
pub mod base;
pub mod ollama;
pub mod openai;

pub use azure::AzureOpenAiProvider;
pub use base::{CompletionOptions, CompletionResponse, Message, Provider, TokenUsage};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::config::ProviderConfig;
use crate::error::{PropsearchError, Result};

/// Create a provider instance for `config.provider_type`
///
/// # Errors
///
/// Returns error if provider type is invalid or initialization fails
///
/// # Examples
///
/// ```
/// use propsearch::config::ProviderConfig;
/// use propsearch::providers::create_provider;
///
/// let config = ProviderConfig {
///     provider_type: "ollama".to_string(),
///     ..Default::default()
/// };
/// let provider = create_provider(&config).unwrap();
/// assert_eq!(provider.name(), "ollama");
/// ```
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    let timeout = config.timeout_seconds;

    match config.provider_type.as_str() {
        "azure" => Ok(Box::new(AzureOpenAiProvider::new(
            config.azure.clone(),
            timeout,
        )?)),
        "openai" => Ok(Box::new(OpenAiProvider::new(
            config.openai.clone(),
            timeout,
        )?)),
        "ollama" => Ok(Box::new(OllamaProvider::new(
            config.ollama.clone(),
            timeout,
        )?)),
        _ => Err(PropsearchError::Provider(format!(
            "Unknown provider type: {}",
            config.provider_type
        ))
        .into()),
    }
}
