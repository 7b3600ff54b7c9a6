//! Propsearch - conversational real-estate search library
//!
//! Free-text property requests go to a language model under a fixed
//! instruction; the reply is either a follow-up question or a filter
//! expression, which is checked against an allow-list and run against a
//! listing collection.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `interpreter`: Model reply parsing and the filter expression allow-list
//! - `providers`: Language-model backends (Azure OpenAI, OpenAI-compatible, Ollama)
//! - `store`: Listing records and the sled-backed collection
//! - `conversation`: Per-session turns and state
//! - `search`: The per-turn step shared by the chat loop and the form server
//! - `render`: Text formatting of result sets
//! - `server`: Form-based presentation over HTTP
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use propsearch::commands::build_search;
//! use propsearch::conversation::Session;
//! use propsearch::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!     config.validate_provider()?;
//!
//!     let search = build_search(&config)?;
//!     let mut session = Session::new(config.search.max_history_turns);
//!     let outcome = search.submit(&mut session, "3BHK in Gachibowli under 20k").await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod interpreter;
pub mod prompts;
pub mod providers;
pub mod render;
pub mod search;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use conversation::{Session, Turn};
pub use error::{PropsearchError, Result};
pub use interpreter::{Interpretation, Interpreter};
pub use search::{PropertySearch, TurnOutcome};

#[cfg(test)]
pub mod test_utils;
