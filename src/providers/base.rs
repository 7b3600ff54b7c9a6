//! Base provider trait and common types for Propsearch
//!
//! This module defines the Provider trait that every language-model backend
//! implements, along with the chat message type, per-request options and the
//! completion response.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message structure for a chat-style request
///
/// Roles follow the chat-completions convention: `system`, `user` or
/// `assistant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use propsearch::providers::Message;
    ///
    /// let msg = Message::system("You are a real estate assistant");
    /// assert_eq!(msg.role, "system");
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use propsearch::providers::Message;
    ///
    /// let msg = Message::user("3BHK in Gachibowli under 20k");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Per-request sampling options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    /// Sampling temperature; 0.0 keeps the output as deterministic as the
    /// backend allows
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self { temperature: 0.0 }
    }
}

/// Token usage information from a completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    pub completion_tokens: usize,
    /// Total tokens used (prompt + completion)
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Examples
    ///
    /// ```
    /// use propsearch::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Completion response with the reply text and optional token usage
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The assistant's reply text, exactly as the backend returned it
    pub content: String,
    /// Optional token usage information
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Create a new CompletionResponse
    ///
    /// # Examples
    ///
    /// ```
    /// use propsearch::providers::CompletionResponse;
    ///
    /// let response = CompletionResponse::new("{\"status\":\"incomplete\"}");
    /// assert!(response.usage.is_none());
    /// ```
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }

    /// Create a new CompletionResponse with token usage
    pub fn with_usage(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            content: content.into(),
            usage: Some(usage),
        }
    }
}

/// Language-model provider
///
/// Implementations send one chat-style request per call and return the
/// reply text. They do not retry and do not inspect the reply content.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Completes a conversation
    ///
    /// # Arguments
    ///
    /// * `messages` - System instruction, prior turns and the new utterance, in order
    /// * `options` - Sampling options for this request
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the backend answers with a
    /// non-success status, or the reply carries no text content
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse>;

    /// Short provider identifier ("azure", "openai", "ollama")
    fn name(&self) -> &str;

    /// Model or deployment the provider sends requests to
    fn model(&self) -> &str;
}
