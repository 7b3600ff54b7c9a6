//! One search step, shared by the chat loop and the form server
//!
//! [`PropertySearch::submit`] takes the session explicitly, runs the
//! interpreter, and either records a follow-up question or executes the
//! filter against the store. Presentations only decide how to show the
//! returned [`TurnOutcome`].

use crate::conversation::{Session, Turn};
use crate::error::Result;
use crate::interpreter::filter::FilterExpression;
use crate::interpreter::{InterpretError, Interpretation, Interpreter};
use crate::store::{Listing, ListingStore};

use std::sync::Arc;

/// Shown when a reply has an unusable shape, and when a step fails outright
pub const UNPROCESSABLE_MESSAGE: &str = "Sorry, I could not process your request. Please try again.";

/// What one submitted utterance led to
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The filter ran; `listings` may be empty
    Results {
        /// Filter that was executed
        filter: FilterExpression,
        /// Matches in store order
        listings: Vec<Listing>,
    },
    /// More information is needed
    Question(String),
    /// The model reply was not JSON; `raw` is shown as-is
    NotUnderstood {
        /// Reply text
        raw: String,
        /// Parse error
        error: InterpretError,
    },
    /// The reply was JSON but unusable
    Unprocessable {
        /// Why it was rejected
        error: InterpretError,
    },
}

/// Interpreter and store wired together
#[derive(Clone)]
pub struct PropertySearch {
    interpreter: Interpreter,
    store: Arc<dyn ListingStore>,
}

impl PropertySearch {
    /// Combine an interpreter with a listing store
    pub fn new(interpreter: Interpreter, store: Arc<dyn ListingStore>) -> Self {
        Self { interpreter, store }
    }

    /// Run one step for `utterance` and update the session
    ///
    /// The utterance joins the history once the model has answered. A
    /// follow-up question joins it as an assistant turn; nothing else does.
    ///
    /// # Errors
    ///
    /// Returns error if the provider call or the store query fails. The
    /// session is left usable either way.
    pub async fn submit(&self, session: &mut Session, utterance: &str) -> Result<TurnOutcome> {
        let interpretation = self
            .interpreter
            .interpret(utterance, session.history())
            .await?;
        session.push_turn(Turn::user(utterance));

        match interpretation {
            Interpretation::Complete { filter } => {
                let listings = self.store.find(&filter)?;
                tracing::info!("Search matched {} listings", listings.len());
                session.record_results(filter.clone(), listings.clone());
                Ok(TurnOutcome::Results { filter, listings })
            }
            Interpretation::Incomplete { question } => {
                session.record_question(&question);
                Ok(TurnOutcome::Question(question))
            }
            Interpretation::Failed {
                error: error @ InterpretError::Malformed(_),
                raw,
            } => Ok(TurnOutcome::NotUnderstood { raw, error }),
            Interpretation::Failed { error, .. } => {
                session.clear_outcome();
                Ok(TurnOutcome::Unprocessable { error })
            }
        }
    }
}
