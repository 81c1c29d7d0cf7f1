/*!
Command handlers for the CLI

- `serve`:     run the chat host over stdio for a rendering surface
- `ask`:       one-shot question (see [`ask`])
- `summarize`: one-shot memory summary (see [`ask`])
- `health`:    probe the memory backend
- `register`:  register this client with the memory backend

Handlers are thin: they build the library components from [`Config`] and
print results. Backend failures during `ask`/`summarize` are printed as the
translated assistant reply rather than returned as errors.
*/

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;

use crate::bridge::host::{HostBridge, HostCommand};
use crate::bridge::transport::LineTransport;
use crate::client::QueryClient;
use crate::config::Config;
use crate::error::{MemchatError, Result};
use crate::workspace::LocalWorkspace;

pub mod ask;

// Chat host over stdio
pub mod serve {
    //! Serves one rendering surface over newline-delimited JSON on
    //! stdin/stdout. Logs go to stderr so they never corrupt the protocol.

    use super::*;

    /// Run the host bridge until stdin closes or Ctrl-C
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded configuration
    /// * `workspace` - Workspace roots overriding `workspace.roots`
    /// * `question` - Prefilled into the compose box on startup
    ///
    /// # Errors
    ///
    /// Returns error if no client id is configured or stdout fails
    pub async fn run_serve(
        config: Config,
        workspace: Vec<PathBuf>,
        question: Option<String>,
    ) -> Result<()> {
        config.require_client_id()?;

        let roots = if workspace.is_empty() {
            config.workspace_roots()
        } else {
            workspace
        };
        tracing::info!(roots = ?roots, "Workspace roots");

        let client = QueryClient::new(&config.backend)?;
        let local = LocalWorkspace::new(roots, config.workspace.editor_command.clone());
        let mut bridge = HostBridge::new(Arc::new(client), Arc::new(local));

        if let Some(question) = question {
            bridge.commands().send(HostCommand::AskQuestion(question));
        }

        let mut transport = LineTransport::stdio();
        tokio::select! {
            result = bridge.attach(&mut transport) => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                Ok(())
            }
        }
    }
}

// Backend health probe
pub mod health {
    use super::*;

    /// Probe the backend and print the outcome
    ///
    /// # Errors
    ///
    /// Returns [`MemchatError::Backend`] when the backend is unhealthy, so
    /// the process exits non-zero.
    pub async fn run_health(config: &Config) -> Result<()> {
        let client = QueryClient::new(&config.backend)?;
        let status = client.health().await;

        if status.healthy {
            println!("{} {}", "ok".green().bold(), client.base_url());
            return Ok(());
        }

        println!("{} {}", "unhealthy:".red().bold(), status.detail);
        Err(MemchatError::Backend(format!(
            "{} is unhealthy: {}",
            client.base_url(),
            status.detail
        ))
        .into())
    }
}

// Client registration
pub mod register {
    use super::*;

    /// Register the configured client id with the backend
    ///
    /// The API key comes from `--api-key`, then `backend.api_key` /
    /// `MEMCHAT_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns error if no client id or API key is available, the client is
    /// already registered, or the backend rejects the request.
    pub async fn run_register(config: &Config, api_key: Option<String>) -> Result<()> {
        let client_id = config.require_client_id()?;
        let api_key = api_key
            .or_else(|| config.backend.api_key.clone())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                MemchatError::Config(
                    "An API key is required (--api-key, backend.api_key or MEMCHAT_API_KEY)"
                        .to_string(),
                )
            })?;

        let client = QueryClient::new(&config.backend)?;
        client.register(&api_key).await?;
        println!("{} client {}", "Registered".green().bold(), client_id);
        Ok(())
    }
}
