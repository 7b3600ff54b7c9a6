//! Query interpreter
//!
//! Turns one user utterance plus the session's earlier turns into exactly one
//! [`Interpretation`]. The model call is the only fallible I/O here; whatever
//! text comes back is classified by [`parse_reply`] and never raised as an
//! error.

pub mod filter;

use crate::conversation::Turn;
use crate::error::Result;
use crate::prompts::build_system_prompt;
use crate::providers::{CompletionOptions, Message, Provider};

use filter::{FilterError, FilterExpression};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Why a model reply could not be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretError {
    /// The reply is not JSON at all
    #[error("reply is not valid JSON: {0}")]
    Malformed(String),

    /// JSON, but not one of the two agreed shapes
    #[error("unexpected reply shape: {0}")]
    UnexpectedShape(String),

    /// The filters object failed the allow-list check
    #[error("filter rejected: {0}")]
    InvalidFilter(#[from] FilterError),
}

/// Classification of one model reply
///
/// Exactly one variant per interpretation: a complete result never carries a
/// question and an incomplete one never carries a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// Enough information to search
    Complete {
        /// Validated filter expression
        filter: FilterExpression,
    },
    /// A follow-up question for the user
    Incomplete {
        /// Question text, never empty
        question: String,
    },
    /// The reply could not be used
    Failed {
        /// What went wrong
        error: InterpretError,
        /// The reply exactly as received
        raw: String,
    },
}

impl Interpretation {
    /// Wire-form status discriminator
    pub fn status(&self) -> &'static str {
        match self {
            Self::Complete { .. } => "complete",
            Self::Incomplete { .. } => "incomplete",
            Self::Failed { .. } => "error",
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum WireInterpretation<'a> {
    Complete {
        filters: &'a FilterExpression,
    },
    Incomplete {
        question: &'a str,
    },
    Error {
        error: String,
        raw_response: &'a str,
    },
}

impl Serialize for Interpretation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Complete { filter } => WireInterpretation::Complete { filters: filter },
            Self::Incomplete { question } => WireInterpretation::Incomplete { question },
            Self::Failed { error, raw } => WireInterpretation::Error {
                error: error.to_string(),
                raw_response: raw,
            },
        };
        wire.serialize(serializer)
    }
}

/// Classify a model reply
///
/// The reply must be a single JSON object. No repair is attempted: a reply
/// wrapped in prose or code fences is [`InterpretError::Malformed`].
///
/// # Examples
///
/// ```
/// use propsearch::interpreter::{parse_reply, Interpretation};
///
/// let reply = r#"{"status": "incomplete", "question": "Which area?"}"#;
/// assert_eq!(
///     parse_reply(reply),
///     Interpretation::Incomplete { question: "Which area?".to_string() }
/// );
///
/// assert!(matches!(parse_reply("Sure! Here you go"), Interpretation::Failed { .. }));
/// ```
pub fn parse_reply(raw: &str) -> Interpretation {
    let failed = |error: InterpretError| Interpretation::Failed {
        error,
        raw: raw.to_string(),
    };

    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return failed(InterpretError::Malformed(e.to_string())),
    };

    let Some(object) = value.as_object() else {
        return failed(InterpretError::UnexpectedShape(
            "reply is not a JSON object".to_string(),
        ));
    };

    match object.get("status").and_then(Value::as_str) {
        Some("complete") => {
            let Some(filters) = object.get("filters") else {
                return failed(InterpretError::UnexpectedShape(
                    "complete reply without filters".to_string(),
                ));
            };
            match FilterExpression::from_document(filters) {
                Ok(filter) => {
                    if filter.is_empty() {
                        tracing::warn!("Model returned an empty filter; every listing will match");
                    }
                    Interpretation::Complete { filter }
                }
                Err(e) => failed(InterpretError::InvalidFilter(e)),
            }
        }
        Some("incomplete") => match object.get("question").and_then(Value::as_str) {
            Some(question) if !question.trim().is_empty() => Interpretation::Incomplete {
                question: question.to_string(),
            },
            _ => failed(InterpretError::UnexpectedShape(
                "incomplete reply without a question".to_string(),
            )),
        },
        Some(other) => failed(InterpretError::UnexpectedShape(format!(
            "unknown status '{}'",
            other
        ))),
        None => failed(InterpretError::UnexpectedShape(
            "missing status".to_string(),
        )),
    }
}

/// Sends utterances to a language model under the fixed search instruction
///
/// Stateless between calls: the caller owns the history.
#[derive(Clone)]
pub struct Interpreter {
    provider: Arc<dyn Provider>,
    system_prompt: String,
    options: CompletionOptions,
}

impl Interpreter {
    /// Create an interpreter over a provider
    pub fn new(provider: Arc<dyn Provider>, options: CompletionOptions) -> Self {
        Self {
            provider,
            system_prompt: build_system_prompt(),
            options,
        }
    }

    /// Provider in use
    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    /// Request sent for one utterance: instruction, history, utterance
    pub fn build_messages(&self, utterance: &str, history: &[Turn]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(history.iter().map(Message::from));
        messages.push(Message::user(utterance));
        messages
    }

    /// Interpret one utterance
    ///
    /// # Errors
    ///
    /// Returns error only when the provider call itself fails; every reply
    /// the provider does return becomes an [`Interpretation`].
    pub async fn interpret(&self, utterance: &str, history: &[Turn]) -> Result<Interpretation> {
        let messages = self.build_messages(utterance, history);

        tracing::debug!(
            "Interpreting utterance with {} ({}), {} prior turns",
            self.provider.name(),
            self.provider.model(),
            history.len()
        );

        let response = self.provider.complete(&messages, &self.options).await?;
        if let Some(usage) = response.usage {
            tracing::debug!(
                "{} usage: prompt_tokens={}, completion_tokens={}, total_tokens={}",
                self.provider.name(),
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }
        let interpretation = parse_reply(&response.content);

        match &interpretation {
            Interpretation::Complete { filter } => {
                tracing::info!("Interpretation complete: filters={}", filter)
            }
            Interpretation::Incomplete { question } => {
                tracing::info!("Interpretation incomplete: {}", question)
            }
            Interpretation::Failed { error, raw } => {
                tracing::warn!("Interpretation failed: {} (raw reply: {:?})", error, raw)
            }
        }

        Ok(interpretation)
    }
}
