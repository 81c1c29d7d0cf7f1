//! Chat data model shared by the session, the query client and the
//! surface protocol.
//!
//! All types serialize with camelCase field names because they cross the
//! host/surface boundary verbatim inside `addMessage` notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a chat entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed by the user in the compose box
    User,
    /// Produced by the host: backend replies, translated failures, welcome
    Assistant,
}

/// A reference to the material a reply was derived from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReference {
    /// Backend identifier, or a placeholder when none is available
    pub path: String,
    /// 1-based first line, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_start: Option<u32>,
    /// 1-based last line, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_end: Option<u32>,
    /// Literal excerpt for inline display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl SourceReference {
    /// Build a reference, filling `line_end` from `line_start` when only the
    /// start is known.
    ///
    /// # Examples
    ///
    /// ```
    /// use memchat::chat::SourceReference;
    ///
    /// let source = SourceReference::new("src/lib.rs", Some(4), None, None);
    /// assert_eq!(source.line_end, Some(4));
    /// ```
    pub fn new(
        path: impl Into<String>,
        line_start: Option<u32>,
        line_end: Option<u32>,
        content: Option<String>,
    ) -> Self {
        Self {
            path: path.into(),
            line_start,
            line_end: line_end.or(line_start),
            content,
        }
    }
}

/// The editor selection or file a question is anchored to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContext {
    /// Display name, e.g. `main.rs`
    pub file_name: String,
    /// Full path of the file
    pub file_path: String,
    /// Selected text, or the whole file
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_end: Option<u32>,
}

impl FileContext {
    /// The `(start, end)` range when both ends are known
    pub fn line_range(&self) -> Option<(u32, u32)> {
        match (self.line_start, self.line_end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

/// One entry of the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Creation time, serialized as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Never `Some(vec![])`; see [`ChatMessage::with_sources`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceReference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<FileContext>,
}

impl ChatMessage {
    /// Create a user message stamped with the current time
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    /// Create an assistant message stamped with the current time
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into())
    }

    fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
            sources: None,
            context: None,
        }
    }

    /// Attach sources; an empty list leaves `sources` absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use memchat::chat::ChatMessage;
    ///
    /// let message = ChatMessage::assistant("hi").with_sources(Vec::new());
    /// assert!(message.sources.is_none());
    /// ```
    pub fn with_sources(mut self, sources: Vec<SourceReference>) -> Self {
        self.sources = if sources.is_empty() {
            None
        } else {
            Some(sources)
        };
        self
    }

    /// Attach the file context the message was sent with
    pub fn with_context(mut self, context: Option<FileContext>) -> Self {
        self.context = context;
        self
    }

    /// Whether this entry was authored by the user
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::User).unwrap(), json!("user"));
        assert_eq!(
            serde_json::to_value(Role::Assistant).unwrap(),
            json!("assistant")
        );
    }

    #[test]
    fn test_source_reference_end_defaults_to_start() {
        let source = SourceReference::new("a.rs", Some(7), None, None);
        assert_eq!(source.line_start, Some(7));
        assert_eq!(source.line_end, Some(7));

        let source = SourceReference::new("a.rs", Some(7), Some(9), None);
        assert_eq!(source.line_end, Some(9));

        let source = SourceReference::new("a.rs", None, None, None);
        assert_eq!(source.line_end, None);
    }

    #[test]
    fn test_empty_sources_are_absent_on_the_wire() {
        let message = ChatMessage::assistant("reply").with_sources(vec![]);
        let value = serde_json::to_value(&message).unwrap();
        assert!(value.get("sources").is_none());
        assert!(value.get("context").is_none());
    }

    #[test]
    fn test_message_wire_shape_is_camel_case() {
        let context = FileContext {
            file_name: "main.rs".to_string(),
            file_path: "/w/src/main.rs".to_string(),
            content: "fn main() {}".to_string(),
            line_start: Some(1),
            line_end: Some(1),
        };
        let message = ChatMessage::user("why?").with_context(Some(context));
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "why?");
        assert!(value["timestamp"].is_i64());
        assert_eq!(value["context"]["fileName"], "main.rs");
        assert_eq!(value["context"]["lineStart"], 1);
    }

    #[test]
    fn test_sources_serialize_with_line_fields() {
        let message = ChatMessage::assistant("see")
            .with_sources(vec![SourceReference::new("x.rs", Some(1), Some(3), None)]);
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["sources"][0]["path"], "x.rs");
        assert_eq!(value["sources"][0]["lineStart"], 1);
        assert_eq!(value["sources"][0]["lineEnd"], 3);
        assert!(value["sources"][0].get("content").is_none());
    }

    #[test]
    fn test_file_context_line_range_needs_both_ends() {
        let mut context = FileContext {
            file_name: "a".to_string(),
            file_path: "a".to_string(),
            content: String::new(),
            line_start: Some(2),
            line_end: None,
        };
        assert_eq!(context.line_range(), None);
        context.line_end = Some(5);
        assert_eq!(context.line_range(), Some((2, 5)));
    }

    #[test]
    fn test_file_context_deserializes_without_lines() {
        let context: FileContext = serde_json::from_value(json!({
            "fileName": "lib.rs",
            "filePath": "/w/lib.rs",
            "content": "pub mod a;"
        }))
        .unwrap();
        assert_eq!(context.line_range(), None);
    }
}
