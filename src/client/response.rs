//! Backend reply shapes and their normalization
//!
//! The memory backend has answered in several shapes over time. Rather than
//! sniffing ad hoc at the call site, a decoded body is first classified into
//! [`BackendReply`], a closed union with one variant per accepted shape, and
//! each variant is then normalized by its own rule into a [`NormalizedReply`].
//!
//! | Shape | Example | Text | Sources |
//! |---|---|---|---|
//! | Pair | `["text", ["a", "b"]]` | element 0 | element 1 |
//! | Object | `{"response": "text", "sources": [..]}` | `response`, else `content` (first non-null) | `sources` |
//! | Scalar | `"text"`, `42`, `true`, `null` | the scalar | none |
//! | Unrecognized | `{"foo": 1}`, `[1, 2, 3]` | JSON rendering of the payload | none |
//!
//! Normalization never fails and never yields blank text: empty or
//! whitespace-only replies become [`EMPTY_REPLY_FALLBACK`].

use serde_json::Value;

/// Shown instead of an empty or whitespace-only backend reply
pub const EMPTY_REPLY_FALLBACK: &str =
    "I couldn't find anything in memory to answer that. Try rephrasing your question or adding more detail.";

/// Object fields that may carry the reply text, in preference order
const TEXT_KEYS: [&str; 2] = ["response", "content"];

/// A decoded backend reply, classified by shape
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply {
    /// Two-element array `[replyText, sourceList]`
    Pair { text: Value, sources: Value },
    /// Object carrying `response` or `content`, plus optional `sources`
    Object { text: Value, sources: Option<Value> },
    /// Bare string, number, boolean or null
    Scalar(Value),
    /// Any other payload
    Unrecognized(Value),
}

/// Reply text and raw source identifiers after normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedReply {
    /// Never blank
    pub text: String,
    /// Raw backend source strings, in backend order
    pub sources: Vec<String>,
}

impl BackendReply {
    /// Classify a raw response body
    ///
    /// Bodies that are not JSON at all are treated as a bare string.
    ///
    /// # Examples
    ///
    /// ```
    /// use memchat::client::response::BackendReply;
    ///
    /// assert!(matches!(BackendReply::from_body("plain words"), BackendReply::Scalar(_)));
    /// assert!(matches!(BackendReply::from_body(r#"["a", []]"#), BackendReply::Pair { .. }));
    /// ```
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::classify(value),
            Err(_) => Self::Scalar(Value::String(body.to_string())),
        }
    }

    /// Classify an already decoded JSON value
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(mut items) if items.len() == 2 => {
                let sources = items.pop().unwrap_or(Value::Null);
                let text = items.pop().unwrap_or(Value::Null);
                Self::Pair { text, sources }
            }
            Value::Object(mut map) => {
                // A null `response` must not shadow a present `content`
                let key = TEXT_KEYS
                    .iter()
                    .find(|key| map.get(**key).is_some_and(|v| !v.is_null()))
                    .or_else(|| TEXT_KEYS.iter().find(|key| map.contains_key(**key)));
                let text = key.and_then(|key| map.remove(*key));
                match text {
                    Some(text) => Self::Object {
                        text,
                        sources: map.remove("sources"),
                    },
                    None => Self::Unrecognized(Value::Object(map)),
                }
            }
            Value::Array(items) => Self::Unrecognized(Value::Array(items)),
            scalar => Self::Scalar(scalar),
        }
    }

    /// Apply the per-variant normalization rule
    pub fn normalize(self) -> NormalizedReply {
        let (text, sources) = match self {
            Self::Pair { text, sources } => (value_text(text), source_list(sources)),
            Self::Object { text, sources } => (
                value_text(text),
                sources.map(source_list).unwrap_or_default(),
            ),
            Self::Scalar(value) => (value_text(value), Vec::new()),
            Self::Unrecognized(value) => {
                tracing::warn!("Unrecognized backend reply shape; rendering it verbatim");
                (value.to_string(), Vec::new())
            }
        };

        NormalizedReply {
            text: non_blank(text),
            sources,
        }
    }
}

/// Normalize a raw response body in one step
pub fn normalize_body(body: &str) -> NormalizedReply {
    BackendReply::from_body(body).normalize()
}

fn non_blank(text: String) -> String {
    if text.trim().is_empty() {
        EMPTY_REPLY_FALLBACK.to_string()
    } else {
        text
    }
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn source_list(value: Value) -> Vec<String> {
    let items = match value {
        Value::Array(items) => items,
        Value::String(s) => vec![Value::String(s)],
        _ => return Vec::new(),
    };

    items
        .into_iter()
        .filter(|item| !item.is_null())
        .map(value_text)
        .filter(|s| !s.trim().is_empty())
        .collect()
}
