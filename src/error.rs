//! Error types for memchat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.
//!
//! Note that the chat path itself does not surface these errors to the
//! rendering surface: backend failures are translated into assistant
//! messages by [`crate::client::QueryClient`]. The variants here describe
//! failures of the host process plumbing (configuration, transport,
//! workspace access) and of the non-chat backend calls.

use thiserror::Error;

/// Main error type for memchat operations
#[derive(Error, Debug)]
pub enum MemchatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Memory backend returned an error or could not be reached
    #[error("Backend error: {0}")]
    Backend(String),

    /// Memory backend answered 404 for the configured client
    #[error("Backend does not know client: {0}")]
    BackendNotFound(String),

    /// Registration was attempted for a client that already exists
    #[error("Client already registered: {0}")]
    ClientAlreadyRegistered(String),

    /// A message on the surface channel could not be decoded or encoded
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The surface transport failed or was closed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Workspace path resolution or file reveal failed
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for memchat operations
///
/// Uses `anyhow::Error` so callers can attach context; typed
/// [`MemchatError`] values are recovered with `downcast_ref` where the
/// variant matters.
pub type Result<T> = anyhow::Result<T>;
