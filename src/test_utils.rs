//! Test utilities for Propsearch
//!
//! This module provides a scripted language-model provider, temporary
//! directory helpers and a test configuration shared by the unit tests.

use crate::config::Config;
use crate::error::{PropsearchError, Result};
use crate::providers::{CompletionOptions, CompletionResponse, Message, Provider};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Configuration that validates without credentials or network
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.provider.provider_type = "ollama".to_string();
    config
}

/// One request seen by a [`ScriptedProvider`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Messages as sent
    pub messages: Vec<Message>,
    /// Sampling temperature as sent
    pub temperature: f32,
}

/// Provider that replays canned replies in order and records each request
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    failure: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    /// Provider answering with `replies`, one per call
    pub fn new<S: Into<String>>(replies: Vec<S>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Provider whose every call fails with a provider error
    pub fn failing(message: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            failure: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            temperature: options.temperature,
        });

        if let Some(message) = &self.failure {
            return Err(PropsearchError::Provider(message.clone()).into());
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PropsearchError::Provider("script exhausted".to_string()))?;
        Ok(CompletionResponse::new(reply))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "listings.json", "[]");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_test_config_validates() {
        let config = test_config();
        assert!(config.validate().is_ok());
        assert!(config.validate_provider().is_ok());
    }

    #[tokio::test]
    async fn test_scripted_provider_replays_in_order() {
        let provider = ScriptedProvider::new(vec!["first", "second"]);
        let options = CompletionOptions::default();

        let first = provider.complete(&[], &options).await.unwrap();
        let second = provider.complete(&[], &options).await.unwrap();
        assert_eq!(first.content, "first");
        assert_eq!(second.content, "second");
        assert!(provider.complete(&[], &options).await.is_err());
        assert_eq!(provider.calls().len(), 3);
    }
}
