//! Error types for Propsearch
//!
//! This module defines the error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Propsearch operations
///
/// Covers configuration loading, language-model provider calls and
/// listing store access. Problems with the *content* of a model reply
/// are not errors: they surface as
/// [`Interpretation::Failed`](crate::interpreter::Interpretation::Failed).
#[derive(Error, Debug)]
pub enum PropsearchError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (transport, HTTP status, empty replies)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// Listing store errors (open, scan, insert)
    #[error("Store error: {0}")]
    Store(String),

    /// A filter document handed to the store was rejected
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Embedded database errors
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
}

/// Result type alias for Propsearch operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to downcast to [`PropsearchError`].
pub type Result<T> = anyhow::Result<T>;
