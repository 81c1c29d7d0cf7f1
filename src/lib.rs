//! memchat - chat with your memory backend from the editor
//!
//! This library provides the host side of a memory chat sidebar: a
//! conversation state machine, a client for the memory backend, and a bridge
//! that talks to an isolated rendering surface through typed messages.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `chat`: Chat messages and the per-sidebar session state machine
//! - `client`: Memory backend client, `@source` directive and reply normalization
//! - `sources`: Source references and workspace path resolution
//! - `workspace`: Host workspace capabilities (roots, reveal, error display)
//! - `bridge`: Surface protocol, transports and the host event loop
//! - `commands`: CLI command handlers
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use memchat::client::{MemoryBackend, QueryClient};
//! use memchat::config::BackendConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BackendConfig {
//!         client_id: "my-laptop".to_string(),
//!         ..Default::default()
//!     };
//!     let client = QueryClient::new(&config)?;
//!     let reply = client.query("what did we decide about retries? @source", None).await;
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod chat;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod sources;
pub mod workspace;

// Re-export commonly used types
pub use bridge::{HostBridge, HostCommand};
pub use chat::{ChatMessage, ChatSession, FileContext, Role, SourceReference};
pub use client::{MemoryBackend, QueryClient};
pub use config::Config;
pub use error::{MemchatError, Result};
