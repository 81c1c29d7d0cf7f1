//! Messages exchanged between the host and the rendering surface
//!
//! Every message is a JSON object with a `type` tag drawn from a closed set.
//! The surface sends [`SurfaceIntent`]s; the host answers with
//! [`HostNotification`]s. Nothing else crosses the boundary.
//!
//! Inbound decoding is tolerant: an unknown `type`, a missing field or
//! invalid JSON is reported as [`DecodedIntent::Unknown`] or
//! [`DecodedIntent::Malformed`] so the caller can log and move on.
//!
//! # Wire examples
//!
//! ```text
//! surface → host  {"type":"sendMessage","message":"where is retry configured?"}
//! surface → host  {"type":"openFile","path":"src/retry.rs","line":12}
//! host → surface  {"type":"addMessage","message":{"role":"user","content":"…","timestamp":1700000000000}}
//! host → surface  {"type":"showTyping"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::{ChatMessage, FileContext};
use crate::error::{MemchatError, Result};

/// Intents the rendering surface may send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SurfaceIntent {
    /// The user pressed send
    SendMessage {
        message: String,
        /// Editor selection the question is anchored to
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<FileContext>,
    },
    /// The user clicked a file reference; `line` is 1-based
    OpenFile {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line: Option<u32>,
    },
}

impl SurfaceIntent {
    /// `type` values this host understands
    pub const KNOWN_TYPES: [&'static str; 2] = ["sendMessage", "openFile"];
}

/// Notifications the host pushes to the rendering surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostNotification {
    /// Append one rendered bubble
    AddMessage { message: ChatMessage },
    /// Show the busy indicator
    ShowTyping,
    /// Hide the busy indicator
    HideTyping,
    /// Prefill the compose box without submitting
    SetInput { message: String },
    /// Wipe the rendered history; an `AddMessage` for the welcome follows
    ClearChat,
}

impl HostNotification {
    /// Serialize for the wire
    ///
    /// # Errors
    ///
    /// Returns [`MemchatError::Protocol`] if serialization fails
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| MemchatError::Protocol(format!("Failed to encode notification: {}", e)).into())
    }

    /// The wire `type` of this notification, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddMessage { .. } => "addMessage",
            Self::ShowTyping => "showTyping",
            Self::HideTyping => "hideTyping",
            Self::SetInput { .. } => "setInput",
            Self::ClearChat => "clearChat",
        }
    }
}

/// Outcome of decoding one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedIntent {
    Intent(SurfaceIntent),
    /// Well-formed message with a `type` this host does not handle
    Unknown(String),
    /// Not JSON, not an object, no `type`, or missing/invalid fields
    Malformed(String),
}

/// Decode one inbound frame from the rendering surface
///
/// # Examples
///
/// ```
/// use memchat::bridge::protocol::{decode_intent, DecodedIntent, SurfaceIntent};
///
/// let decoded = decode_intent(r#"{"type":"sendMessage","message":"hi"}"#);
/// assert_eq!(
///     decoded,
///     DecodedIntent::Intent(SurfaceIntent::SendMessage { message: "hi".into(), context: None })
/// );
/// assert!(matches!(decode_intent(r#"{"type":"ping"}"#), DecodedIntent::Unknown(_)));
/// ```
pub fn decode_intent(raw: &str) -> DecodedIntent {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return DecodedIntent::Malformed(format!("invalid JSON: {}", e)),
    };

    let kind = match value.get("type").and_then(Value::as_str) {
        Some(kind) => kind.to_string(),
        None => return DecodedIntent::Malformed("missing string `type` field".to_string()),
    };

    if !SurfaceIntent::KNOWN_TYPES.contains(&kind.as_str()) {
        return DecodedIntent::Unknown(kind);
    }

    match serde_json::from_value::<SurfaceIntent>(value) {
        Ok(intent) => DecodedIntent::Intent(intent),
        Err(e) => DecodedIntent::Malformed(format!("invalid `{}` payload: {}", kind, e)),
    }
}
