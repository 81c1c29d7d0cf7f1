//! Conversation state for one sidebar instance
//!
//! [`ChatSession`] owns the ordered message log and the busy flag. It is a
//! plain value with no I/O: the host bridge asks it for permission to start
//! a query ([`ChatSession::submit`]), performs the query elsewhere, and
//! hands the reply back through [`ChatSession::resolve`].
//!
//! # States
//!
//! ```text
//!            submit                      resolve (current generation)
//!   Idle ─────────────▶ AwaitingReply ───────────────────────────────▶ Idle
//!    ▲                        │
//!    └──────── clear ─────────┘   (generation += 1, stale replies dropped)
//! ```
//!
//! A submit while `AwaitingReply` is rejected, so at most one query is in
//! flight per session and replies can never land out of order.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::message::{ChatMessage, FileContext};

/// Seed message shown when a session starts and after every clear
pub const WELCOME_MESSAGE: &str = "Hi! I'm connected to your memory. Ask me anything about what \
has been collected from your Google Drive, Telegram chats and Git repositories.\n\n\
Tips:\n\
- Select code before asking to attach it as context\n\
- Add @source to get the exact fragments an answer was derived from\n\
- Run \"Ask Memory\" from the command palette for a quick question";

/// User entry recorded for the summarize command
pub const SUMMARIZE_PROMPT: &str = "Summarize all the memories that you have";

/// Whether a query is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingReply,
}

/// Why a submission was not accepted
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// A query is already in flight for this session
    #[error("a reply is still pending")]
    Busy,

    /// Nothing but whitespace was submitted
    #[error("message is empty")]
    Empty,
}

/// What the host must ask the backend once a submission is accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// A regular question, passed to the query client verbatim
    Ask {
        text: String,
        context: Option<FileContext>,
    },
    /// The backend's "summarize everything" call
    Summarize,
}

/// Ticket for an accepted submission
///
/// Carries the session generation it was issued in; a reply presented with
/// a ticket from an older generation is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    generation: u64,
    pub kind: QueryKind,
}

impl PendingQuery {
    /// Generation the ticket was issued in
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Ordered message log plus the busy flag for one sidebar instance
#[derive(Debug, Clone)]
pub struct ChatSession {
    history: Vec<ChatMessage>,
    state: SessionState,
    generation: u64,
    last_timestamp: DateTime<Utc>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// Create a session seeded with the welcome message
    ///
    /// # Examples
    ///
    /// ```
    /// use memchat::chat::{ChatSession, Role};
    ///
    /// let session = ChatSession::new();
    /// assert_eq!(session.history().len(), 1);
    /// assert_eq!(session.history()[0].role, Role::Assistant);
    /// assert!(!session.is_busy());
    /// ```
    pub fn new() -> Self {
        let mut session = Self {
            history: Vec::new(),
            state: SessionState::Idle,
            generation: 0,
            last_timestamp: DateTime::<Utc>::MIN_UTC,
        };
        session.append(ChatMessage::assistant(WELCOME_MESSAGE));
        session
    }

    /// The conversation in insertion order
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True exactly while a query is in flight
    pub fn is_busy(&self) -> bool {
        self.state == SessionState::AwaitingReply
    }

    /// Incremented on every [`ChatSession::clear`]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Accept a user question
    ///
    /// On success the user entry has been appended (see
    /// [`ChatSession::last`]) and the session is `AwaitingReply`.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Busy`] while a reply is pending,
    /// [`SubmitError::Empty`] for whitespace-only text. Neither changes
    /// the history.
    pub fn submit(
        &mut self,
        text: &str,
        context: Option<FileContext>,
    ) -> std::result::Result<PendingQuery, SubmitError> {
        if self.is_busy() {
            return Err(SubmitError::Busy);
        }
        if text.trim().is_empty() {
            return Err(SubmitError::Empty);
        }

        self.append(ChatMessage::user(text).with_context(context.clone()));
        Ok(self.begin(QueryKind::Ask {
            text: text.to_string(),
            context,
        }))
    }

    /// Accept a summarize request, recorded as a fixed user entry
    ///
    /// # Errors
    ///
    /// [`SubmitError::Busy`] while a reply is pending.
    pub fn submit_summary(&mut self) -> std::result::Result<PendingQuery, SubmitError> {
        if self.is_busy() {
            return Err(SubmitError::Busy);
        }
        self.append(ChatMessage::user(SUMMARIZE_PROMPT));
        Ok(self.begin(QueryKind::Summarize))
    }

    fn begin(&mut self, kind: QueryKind) -> PendingQuery {
        self.state = SessionState::AwaitingReply;
        PendingQuery {
            generation: self.generation,
            kind,
        }
    }

    /// Record the reply for an accepted submission and return to `Idle`
    ///
    /// Returns the appended entry, or `None` when the ticket belongs to a
    /// generation that was cleared away (the reply is dropped).
    pub fn resolve(&mut self, pending: &PendingQuery, reply: ChatMessage) -> Option<&ChatMessage> {
        if pending.generation != self.generation || !self.is_busy() {
            tracing::debug!(
                ticket = pending.generation,
                current = self.generation,
                "Discarding reply from a cleared session"
            );
            return None;
        }

        self.state = SessionState::Idle;
        self.append(reply);
        self.history.last()
    }

    /// Reset to a single fresh welcome message, abandoning any pending query
    pub fn clear(&mut self) -> &ChatMessage {
        self.generation += 1;
        self.state = SessionState::Idle;
        self.history.clear();
        self.append(ChatMessage::assistant(WELCOME_MESSAGE));
        &self.history[0]
    }

    /// Most recent entry; a session is never empty
    pub fn last(&self) -> Option<&ChatMessage> {
        self.history.last()
    }

    fn append(&mut self, mut message: ChatMessage) {
        if message.timestamp < self.last_timestamp {
            message.timestamp = self.last_timestamp;
        }
        self.last_timestamp = message.timestamp;
        self.history.push(message);
    }
}
