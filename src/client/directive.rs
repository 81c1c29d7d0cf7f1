//! Outbound request composition
//!
//! Turns what the user typed (plus an optional editor context) into the
//! exact text sent to the memory backend.
//!
//! # Request kinds
//!
//! - Plain: the text is sent verbatim.
//! - Source-seeking: the text contains the `@source` directive (any case).
//!   Every occurrence is stripped, the remainder is trimmed, and an
//!   instruction asking for the originating fragments is appended. A
//!   directive with no question left over is answered locally.
//! - Context-augmented: a `[Context from …]` block is prepended. This
//!   combines with either of the above.

use std::sync::OnceLock;

use regex::Regex;

use crate::chat::FileContext;

/// Marker requesting a source-attributed answer
pub const DIRECTIVE_TOKEN: &str = "@source";

/// Reply given when the directive is sent without a question
pub const CLARIFICATION_MESSAGE: &str = "Please add a question after @source, for example: \
\"@source where is the retry policy configured?\"";

/// Appended to source-seeking requests
pub const SOURCE_INSTRUCTION: &str =
    "Include the exact source fragments your answer is derived from.";

/// Result of composing a request from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposedRequest {
    /// Send `body` to the backend
    Send {
        body: String,
        /// Whether the user asked for source fragments
        wants_sources: bool,
    },
    /// Do not contact the backend; answer with [`CLARIFICATION_MESSAGE`]
    NeedsClarification,
}

fn directive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)@source").expect("directive pattern is valid"))
}

/// Whether `text` contains the directive token, ignoring case
///
/// # Examples
///
/// ```
/// use memchat::client::directive::has_directive;
///
/// assert!(has_directive("@SOURCE where is main?"));
/// assert!(!has_directive("where is main?"));
/// ```
pub fn has_directive(text: &str) -> bool {
    directive_pattern().is_match(text)
}

/// Remove every directive occurrence and trim; `None` when there was none
pub fn strip_directive(text: &str) -> Option<String> {
    if !has_directive(text) {
        return None;
    }
    Some(directive_pattern().replace_all(text, "").trim().to_string())
}

/// Render the context block that precedes a context-augmented request
///
/// `[Context from <fileName>[ lines <start>-<end>]]:\n<content>\n\n`
pub fn format_context_block(context: &FileContext) -> String {
    let location = match context.line_range() {
        Some((start, end)) => format!("{} lines {}-{}", context.file_name, start, end),
        None => context.file_name.clone(),
    };
    format!("[Context from {}]:\n{}\n\n", location, context.content)
}

/// Compose the backend request for `text` and optional `context`
///
/// # Examples
///
/// ```
/// use memchat::client::directive::{compose_request, ComposedRequest};
///
/// assert_eq!(
///     compose_request("hello", None),
///     ComposedRequest::Send { body: "hello".to_string(), wants_sources: false }
/// );
/// assert_eq!(compose_request("@source  ", None), ComposedRequest::NeedsClarification);
/// ```
pub fn compose_request(text: &str, context: Option<&FileContext>) -> ComposedRequest {
    let (question, wants_sources) = match strip_directive(text) {
        Some(rest) if rest.is_empty() => return ComposedRequest::NeedsClarification,
        Some(rest) => (format!("{}\n\n{}", rest, SOURCE_INSTRUCTION), true),
        None => (text.to_string(), false),
    };

    let body = match context {
        Some(context) => format!("{}{}", format_context_block(context), question),
        None => question,
    };

    ComposedRequest::Send {
        body,
        wants_sources,
    }
}
