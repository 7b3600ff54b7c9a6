//! Per-session conversation state
//!
//! A [`Session`] is the explicit context handed to each search step: the
//! turns exchanged so far plus the last filter, result set and pending
//! follow-up question. Nothing here outlives the process.

use crate::interpreter::filter::FilterExpression;
use crate::providers::Message;
use crate::store::Listing;

use serde::{Deserialize, Serialize};

/// Smallest history cap: one user turn and the question it prompted
const MIN_HISTORY_TURNS: usize = 2;

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person searching
    User,
    /// A follow-up question from the interpreter
    Assistant,
}

impl Role {
    /// Chat-completions role name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One labelled message in the conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Speaker
    pub role: Role,
    /// Text as entered or asked
    pub content: String,
}

impl Turn {
    /// User turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Turn> for Message {
    fn from(turn: &Turn) -> Self {
        match turn.role {
            Role::User => Message::user(turn.content.clone()),
            Role::Assistant => Message::assistant(turn.content.clone()),
        }
    }
}

/// State of one search session
///
/// History is append-only until it passes the cap. Past the cap, the oldest
/// turns are dropped together with any follow-up question that answered
/// them, so the retained history always opens with a user turn.
///
/// # Examples
///
/// ```
/// use propsearch::conversation::{Role, Session, Turn};
///
/// let mut session = Session::new(3);
/// session.push_turn(Turn::user("I want a flat"));
/// session.push_turn(Turn::assistant("Which area?"));
/// session.push_turn(Turn::user("Kondapur"));
/// session.push_turn(Turn::assistant("What budget?"));
///
/// assert_eq!(session.history().len(), 2);
/// assert_eq!(session.history()[0].role, Role::User);
/// assert_eq!(session.history()[0].content, "Kondapur");
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    history: Vec<Turn>,
    max_history_turns: usize,
    last_filter: Option<FilterExpression>,
    last_results: Option<Vec<Listing>>,
    pending_question: Option<String>,
}

impl Session {
    /// Empty session keeping at most `max_history_turns` turns
    ///
    /// The cap never drops below one user turn plus its follow-up question.
    pub fn new(max_history_turns: usize) -> Self {
        Self {
            history: Vec::new(),
            max_history_turns: max_history_turns.max(MIN_HISTORY_TURNS),
            last_filter: None,
            last_results: None,
            pending_question: None,
        }
    }

    /// Turns in order, oldest first
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Append a turn, dropping the oldest exchanges past the cap
    pub fn push_turn(&mut self, turn: Turn) {
        self.history.push(turn);
        if self.history.len() <= self.max_history_turns {
            return;
        }

        // A question whose user turn was dropped goes with it
        let mut cut = self.history.len() - self.max_history_turns;
        while self
            .history
            .get(cut)
            .is_some_and(|turn| turn.role == Role::Assistant)
        {
            cut += 1;
        }

        self.history.drain(..cut);
        tracing::debug!("Dropped {} oldest turns from session history", cut);
    }

    /// Filter of the most recent complete interpretation
    pub fn last_filter(&self) -> Option<&FilterExpression> {
        self.last_filter.as_ref()
    }

    /// Listings from the most recent search; `None` when nothing is shown
    pub fn last_results(&self) -> Option<&[Listing]> {
        self.last_results.as_deref()
    }

    /// Follow-up question awaiting an answer
    pub fn pending_question(&self) -> Option<&str> {
        self.pending_question.as_deref()
    }

    pub(crate) fn record_question(&mut self, question: &str) {
        self.pending_question = Some(question.to_string());
        self.last_results = None;
        self.push_turn(Turn::assistant(question));
    }

    pub(crate) fn record_results(&mut self, filter: FilterExpression, results: Vec<Listing>) {
        self.last_filter = Some(filter);
        self.last_results = Some(results);
        self.pending_question = None;
    }

    pub(crate) fn clear_outcome(&mut self) {
        self.pending_question = None;
        self.last_results = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(crate::config::SearchConfig::default().max_history_turns)
    }
}
