//! Command-line interface definition for memchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for serving a chat surface, one-shot questions,
//! and backend maintenance.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// memchat - converse with your memory backend from the editor
///
/// `serve` runs the host side of the chat sidebar, speaking newline
/// delimited JSON with the rendering surface over stdin/stdout.
#[derive(Parser, Debug, Clone)]
#[command(name = "memchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub json_logs: bool,

    /// Override the memory backend base URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Override the client identifier sent to the backend
    #[arg(long)]
    pub client_id: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for memchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the chat host over stdio for a rendering surface
    Serve {
        /// Workspace root (repeatable; the first one resolves relative paths)
        #[arg(short, long)]
        workspace: Vec<PathBuf>,

        /// Prefill the compose box with this question on startup
        #[arg(short, long)]
        question: Option<String>,
    },

    /// Ask a single question and print the reply
    Ask {
        /// Question text (may contain the @source directive)
        text: String,

        /// Attach the contents of this file as context
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Restrict the attached context to a line range, e.g. `10-20`
        #[arg(short, long, requires = "file")]
        lines: Option<String>,

        /// Print the reply as a JSON chat message
        #[arg(long)]
        json: bool,
    },

    /// Ask the backend to summarize everything it remembers
    Summarize {
        /// Print the reply as a JSON chat message
        #[arg(long)]
        json: bool,
    },

    /// Check whether the memory backend is reachable
    Health,

    /// Register this client with the memory backend
    Register {
        /// API key to register (falls back to config / MEMCHAT_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
