//! System prompts for the query interpreter
//!
//! The instruction is fixed for the life of the process; it is built once
//! and shared by every interpretation call.

pub mod search_prompt;

/// Builds the interpreter's system prompt
///
/// # Examples
///
/// ```
/// use propsearch::prompts::build_system_prompt;
///
/// let prompt = build_system_prompt();
/// assert!(prompt.contains("\"status\""));
/// ```
pub fn build_system_prompt() -> String {
    search_prompt::generate_search_prompt()
}
