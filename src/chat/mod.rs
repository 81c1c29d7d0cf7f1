//! Chat data model and per-sidebar session state

pub mod message;
pub mod session;

pub use message::{ChatMessage, FileContext, Role, SourceReference};
pub use session::{
    ChatSession, PendingQuery, QueryKind, SessionState, SubmitError, SUMMARIZE_PROMPT,
    WELCOME_MESSAGE,
};
