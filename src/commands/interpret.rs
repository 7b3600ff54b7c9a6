//! One-shot interpretation
//!
//! Sends a single utterance with no history and prints the result in the
//! interpreter's JSON wire form: `complete`, `incomplete` or `error`.

use crate::config::Config;
use crate::error::Result;
use crate::interpreter::Interpretation;

use super::build_interpreter;

/// Interpret `query` and print the JSON result to stdout
///
/// # Errors
///
/// Returns error if the provider cannot be reached. An unusable reply is not
/// an error; it prints with status `error`.
pub async fn run_interpret(config: Config, query: &str) -> Result<()> {
    let interpretation = interpret_once(&config, query).await?;
    println!("{}", serde_json::to_string_pretty(&interpretation)?);
    Ok(())
}

/// Interpret `query` without history
///
/// # Errors
///
/// Returns error if the provider cannot be initialized or reached
pub async fn interpret_once(config: &Config, query: &str) -> Result<Interpretation> {
    let interpreter = build_interpreter(config)?;
    interpreter.interpret(query, &[]).await
}
