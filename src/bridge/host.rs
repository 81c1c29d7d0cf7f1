//! Host side of the sidebar
//!
//! [`HostBridge`] owns the [`ChatSession`] for one sidebar instance and is
//! the only thing that mutates it. While a surface is attached it runs a
//! single event loop over three sources:
//!
//! 1. fire-and-forget [`HostCommand`]s from outside the chat view
//! 2. inbound frames from the surface (`sendMessage`, `openFile`)
//! 3. completions of backend queries, which run as spawned tasks and report
//!    back over an internal channel tagged with their [`PendingQuery`]
//!
//! Because only the loop touches the session, replies cannot interleave, and
//! a reply whose generation was cleared away is dropped by
//! [`ChatSession::resolve`].
//!
//! For one submission the surface observes exactly:
//!
//! ```text
//! addMessage(user) → showTyping → hideTyping → addMessage(assistant)
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;

use super::protocol::{decode_intent, DecodedIntent, HostNotification, SurfaceIntent};
use super::transport::SurfaceTransport;
use crate::chat::{ChatMessage, ChatSession, FileContext, PendingQuery, QueryKind, SubmitError};
use crate::client::MemoryBackend;
use crate::error::Result;
use crate::sources::resolve_workspace_path;
use crate::workspace::Workspace;

/// Triggers invoked from outside the chat view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Focus the chat view
    OpenChat,
    /// Prefill the compose box with a question, without submitting it
    AskQuestion(String),
    /// Reset the conversation
    ClearChat,
    /// Ask the backend to summarize everything it remembers
    Summarize,
}

/// Cloneable handle for sending [`HostCommand`]s to a bridge
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<HostCommand>,
}

impl CommandSender {
    /// Queue a command; it runs the next time the bridge loop is attached
    pub fn send(&self, command: HostCommand) {
        if self.tx.send(command).is_err() {
            tracing::warn!("Host bridge is gone; dropping command");
        }
    }
}

/// A finished backend call, tagged with the ticket it was issued for
#[derive(Debug)]
struct Completion {
    pending: PendingQuery,
    reply: ChatMessage,
}

enum Event {
    Frame(Option<String>),
    Command(HostCommand),
    Completion(Completion),
}

/// Mediates between one rendering surface, the memory backend and the
/// workspace
pub struct HostBridge {
    session: ChatSession,
    backend: Arc<dyn MemoryBackend>,
    workspace: Arc<dyn Workspace>,
    typing_shown: bool,
    commands_tx: mpsc::UnboundedSender<HostCommand>,
    commands_rx: mpsc::UnboundedReceiver<HostCommand>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl HostBridge {
    /// Create a bridge with a fresh session
    pub fn new(backend: Arc<dyn MemoryBackend>, workspace: Arc<dyn Workspace>) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            session: ChatSession::new(),
            backend,
            workspace,
            typing_shown: false,
            commands_tx,
            commands_rx,
            completions_tx,
            completions_rx,
        }
    }

    /// Handle for triggering host commands
    pub fn commands(&self) -> CommandSender {
        CommandSender {
            tx: self.commands_tx.clone(),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Serve one surface until it goes away
    ///
    /// The surface first receives the whole history (plus `showTyping` if a
    /// reply is pending), so a re-shown surface renders the same state.
    /// The session outlives the surface; call `attach` again with a new
    /// transport to resume.
    ///
    /// # Errors
    ///
    /// Returns error only if the transport fails while sending.
    pub async fn attach<T: SurfaceTransport>(&mut self, transport: &mut T) -> Result<()> {
        tracing::info!(
            messages = self.session.history().len(),
            busy = self.session.is_busy(),
            "Surface attached"
        );

        self.typing_shown = false;
        for message in self.session.history().to_vec() {
            emit(transport, HostNotification::AddMessage { message }).await?;
        }
        if self.session.is_busy() {
            self.set_typing(transport, true).await?;
        }

        loop {
            // Completions last: a submit that arrived before a completion
            // must meet the busy guard, not the freshly idle session.
            let event = tokio::select! {
                biased;
                Some(command) = self.commands_rx.recv() => Event::Command(command),
                frame = transport.recv() => Event::Frame(frame),
                Some(done) = self.completions_rx.recv() => Event::Completion(done),
            };

            match event {
                Event::Frame(None) => {
                    tracing::info!("Surface detached");
                    return Ok(());
                }
                Event::Frame(Some(raw)) => self.handle_frame(transport, &raw).await?,
                Event::Command(command) => self.handle_command(transport, command).await?,
                Event::Completion(done) => self.handle_completion(transport, done).await?,
            }
        }
    }

    async fn handle_frame<T: SurfaceTransport>(&mut self, transport: &mut T, raw: &str) -> Result<()> {
        match decode_intent(raw) {
            DecodedIntent::Intent(SurfaceIntent::SendMessage { message, context }) => {
                self.submit(transport, &message, context).await
            }
            DecodedIntent::Intent(SurfaceIntent::OpenFile { path, line }) => {
                self.open_file(&path, line);
                Ok(())
            }
            DecodedIntent::Unknown(kind) => {
                tracing::warn!("Ignoring surface message with unknown type: {}", kind);
                Ok(())
            }
            DecodedIntent::Malformed(reason) => {
                tracing::warn!("Ignoring malformed surface message: {}", reason);
                Ok(())
            }
        }
    }

    async fn handle_command<T: SurfaceTransport>(
        &mut self,
        transport: &mut T,
        command: HostCommand,
    ) -> Result<()> {
        tracing::debug!(?command, "Host command");
        match command {
            HostCommand::OpenChat => {
                tracing::info!("Chat view opened");
                Ok(())
            }
            HostCommand::AskQuestion(text) => {
                emit(transport, HostNotification::SetInput { message: text }).await
            }
            HostCommand::ClearChat => self.clear(transport).await,
            HostCommand::Summarize => match self.session.submit_summary() {
                Ok(pending) => self.begin(transport, pending).await,
                Err(e) => {
                    tracing::warn!("Ignoring summarize request: {}", e);
                    Ok(())
                }
            },
        }
    }

    async fn submit<T: SurfaceTransport>(
        &mut self,
        transport: &mut T,
        text: &str,
        context: Option<FileContext>,
    ) -> Result<()> {
        match self.session.submit(text, context) {
            Ok(pending) => self.begin(transport, pending).await,
            Err(SubmitError::Busy) => {
                tracing::warn!("Ignoring submission while a reply is pending");
                Ok(())
            }
            Err(SubmitError::Empty) => {
                tracing::debug!("Ignoring empty submission");
                Ok(())
            }
        }
    }

    /// Announce the accepted user entry and start the backend call
    async fn begin<T: SurfaceTransport>(&mut self, transport: &mut T, pending: PendingQuery) -> Result<()> {
        if let Some(message) = self.session.last().cloned() {
            emit(transport, HostNotification::AddMessage { message }).await?;
        }
        self.set_typing(transport, true).await?;
        self.spawn_query(pending);
        Ok(())
    }

    fn spawn_query(&self, pending: PendingQuery) {
        let backend = Arc::clone(&self.backend);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let reply = match &pending.kind {
                QueryKind::Ask { text, context } => backend.query(text, context.as_ref()).await,
                QueryKind::Summarize => backend.summarize().await,
            };
            if completions.send(Completion { pending, reply }).is_err() {
                tracing::debug!("Host bridge dropped before query completed");
            }
        });
    }

    async fn handle_completion<T: SurfaceTransport>(
        &mut self,
        transport: &mut T,
        done: Completion,
    ) -> Result<()> {
        let Some(reply) = self.session.resolve(&done.pending, done.reply).cloned() else {
            return Ok(());
        };
        self.set_typing(transport, false).await?;
        emit(transport, HostNotification::AddMessage { message: reply }).await
    }

    async fn clear<T: SurfaceTransport>(&mut self, transport: &mut T) -> Result<()> {
        tracing::info!("Clearing chat");
        self.set_typing(transport, false).await?;
        let welcome = self.session.clear().clone();
        emit(transport, HostNotification::ClearChat).await?;
        emit(transport, HostNotification::AddMessage { message: welcome }).await
    }

    /// Resolve and reveal a file; failures go to the user, not the session
    fn open_file(&self, path: &str, line: Option<u32>) {
        let roots = self.workspace.roots();
        let zero_based = line.map(|l| l.saturating_sub(1));
        let result = resolve_workspace_path(&roots, path)
            .and_then(|resolved| self.workspace.reveal(&resolved, zero_based));

        if let Err(e) = result {
            tracing::warn!(path = %path, "Failed to open file: {:#}", e);
            self.workspace.show_error(&e.to_string());
        }
    }

    /// Toggle the indicator only on an actual change
    async fn set_typing<T: SurfaceTransport>(&mut self, transport: &mut T, shown: bool) -> Result<()> {
        if self.typing_shown == shown {
            return Ok(());
        }
        let notification = if shown {
            HostNotification::ShowTyping
        } else {
            HostNotification::HideTyping
        };
        emit(transport, notification).await?;
        self.typing_shown = shown;
        Ok(())
    }
}

async fn emit<T: SurfaceTransport>(transport: &mut T, notification: HostNotification) -> Result<()> {
    tracing::debug!("→ {}", notification.kind());
    transport.send(notification.encode()?).await
}
