//! Command-line interface definition for Propsearch
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the interactive chat loop, the form server and a few
//! one-shot helpers for working with the listing collection.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Propsearch - conversational real-estate search
///
/// Describe the home you want in plain words; a language model turns the
/// request into a listing filter and asks follow-up questions when details
/// are missing.
#[derive(Parser, Debug, Clone)]
#[command(name = "propsearch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "PROPSEARCH_CONFIG", default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the provider from config (azure, openai, ollama)
    #[arg(short, long, global = true)]
    pub provider: Option<String>,

    /// Override the listing database directory
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Propsearch
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive search loop in the terminal
    Chat,

    /// Serve the form-based search page over HTTP
    Serve {
        /// Bind address (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Interpret a single request and print the result as JSON
    Interpret {
        /// Free-text search request
        query: String,
    },

    /// Load listings from a JSON array file into the collection
    Import {
        /// Path to a JSON file holding an array of listing objects
        file: PathBuf,

        /// Remove existing listings before loading
        #[arg(long)]
        replace: bool,
    },

    /// Run a filter expression against the collection and print the results
    Search {
        /// Filter expression as JSON, e.g. '{"price": {"$lte": 20000}}'
        #[arg(short, long)]
        filter: String,
    },
}

impl Commands {
    /// Whether the command talks to the language model
    pub fn uses_provider(&self) -> bool {
        matches!(
            self,
            Commands::Chat | Commands::Serve { .. } | Commands::Interpret { .. }
        )
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
