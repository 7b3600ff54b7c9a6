/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`: Interactive search loop
- `interpret`: One-shot interpretation printed as JSON
- `listings`: Import listings and run filters directly against the store

The form server lives in [`crate::server`]; it shares [`build_search`] with
the chat loop.
*/

use crate::config::Config;
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::providers::{create_provider, CompletionOptions, Provider};
use crate::search::PropertySearch;
use crate::store::SledListingStore;

use std::sync::Arc;

// One-shot interpretation
pub mod interpret;

// Listing import and direct search
pub mod listings;

/// Open the configured listing collection
///
/// # Errors
///
/// Returns error if the database cannot be opened
pub fn open_store(config: &Config) -> Result<SledListingStore> {
    if let Some(parent) = config.store.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    SledListingStore::open(&config.store.path, &config.store.collection)
}

/// Create the interpreter for the configured provider
///
/// # Errors
///
/// Returns error if the provider cannot be initialized
pub fn build_interpreter(config: &Config) -> Result<Interpreter> {
    let provider: Arc<dyn Provider> = Arc::from(create_provider(&config.provider)?);
    let options = CompletionOptions {
        temperature: config.provider.temperature,
    };
    Ok(Interpreter::new(provider, options))
}

/// Wire interpreter and store together from configuration
///
/// # Errors
///
/// Returns error if the provider or the store cannot be initialized
pub fn build_search(config: &Config) -> Result<PropertySearch> {
    let interpreter = build_interpreter(config)?;
    let store = open_store(config)?;
    Ok(PropertySearch::new(interpreter, Arc::new(store)))
}

// Chat command handler
pub mod chat {
    //! Interactive search loop.
    //!
    //! Reads one query per line, runs a search step, and prints either the
    //! follow-up question or the results. After results the user is asked
    //! whether to refine; declining ends the session.

    use super::*;
    use crate::conversation::Session;
    use crate::render::format_results;
    use crate::search::{TurnOutcome, UNPROCESSABLE_MESSAGE};

    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    const WELCOME: &str = "Welcome to Property Search! How can I help you?";
    const QUERY_PROMPT: &str = "Your search query: ";
    const REFINE_PROMPT: &str = "Would you like to refine your search? (yes/no): ";
    const REFINE_HINT: &str = "Please provide additional filters or modifications";
    const FAREWELL: &str = "Thank you for using Property Search!";
    const GOODBYE: &str = "Goodbye!";

    /// True for the words that end the session
    pub fn is_exit_command(input: &str) -> bool {
        matches!(input.trim().to_lowercase().as_str(), "exit" | "quit")
    }

    /// True for answers that continue the session after results
    pub fn is_affirmative(input: &str) -> bool {
        matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
    }

    /// Start the interactive search loop
    ///
    /// # Errors
    ///
    /// Returns error if the provider, the store or the line editor cannot be
    /// initialized. Failures inside a step are reported and the loop goes on.
    pub async fn run_chat(config: Config) -> Result<()> {
        tracing::info!("Starting interactive search");

        let search = build_search(&config)?;
        let mut session = Session::new(config.search.max_history_turns);
        let mut rl = DefaultEditor::new()?;

        println!("{}", WELCOME.bold());

        loop {
            println!();
            let line = match rl.readline(QUERY_PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            };

            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if is_exit_command(query) {
                break;
            }
            rl.add_history_entry(query)?;

            let outcome = match search.submit(&mut session, query).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Search step failed: {:#}", e);
                    println!("\n{}", UNPROCESSABLE_MESSAGE.red());
                    continue;
                }
            };

            match outcome {
                TurnOutcome::NotUnderstood { raw, .. } => println!("{}", raw),
                TurnOutcome::Question(question) => println!("\n{}", question.cyan()),
                TurnOutcome::Unprocessable { .. } => {
                    println!("\n{}", UNPROCESSABLE_MESSAGE.yellow())
                }
                TurnOutcome::Results { listings, .. } => {
                    println!("{}", "Searching properties:".green());
                    println!("\n{}", format_results(&listings));

                    println!();
                    let answer = rl.readline(REFINE_PROMPT).unwrap_or_default();
                    if is_affirmative(&answer) {
                        println!("{}", REFINE_HINT);
                    } else {
                        println!("{}", FAREWELL.bold());
                        return Ok(());
                    }
                }
            }
        }

        println!("{}", GOODBYE);
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ListingStore;
    use crate::test_utils::{temp_dir, test_config};

    #[test]
    fn test_open_store_creates_parent_directories() {
        let dir = temp_dir();
        let mut config = test_config();
        config.store.path = dir.path().join("nested").join("listings.db");

        let store = open_store(&config).unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(dir.path().join("nested").exists());
    }

    #[test]
    fn test_build_interpreter_uses_configured_provider() {
        let config = test_config();
        let interpreter = build_interpreter(&config).unwrap();
        assert_eq!(interpreter.provider().name(), "ollama");
    }

    #[test]
    fn test_build_interpreter_rejects_unknown_provider() {
        let mut config = test_config();
        config.provider.provider_type = "nope".to_string();
        assert!(build_interpreter(&config).is_err());
    }
}
