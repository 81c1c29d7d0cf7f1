//! Host workspace capabilities
//!
//! The chat core never walks the filesystem or drives an editor itself. It
//! asks a [`Workspace`] for the open roots, to reveal a resolved file at a
//! line, and to show the user a one-shot error.
//!
//! [`LocalWorkspace`] is the implementation used by `memchat serve`: roots
//! come from configuration, and files are revealed by launching the
//! configured editor command.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use colored::Colorize;
use tokio::process::Command;

use crate::error::{MemchatError, Result};

/// Editor-side capabilities the host bridge depends on
#[cfg_attr(test, mockall::automock)]
pub trait Workspace: Send + Sync {
    /// Open workspace roots; the first one anchors relative paths
    fn roots(&self) -> Vec<PathBuf>;

    /// Reveal an existing file, optionally at a 0-based line
    fn reveal(&self, path: &Path, line: Option<u32>) -> Result<()>;

    /// Show a one-shot error notification to the user
    fn show_error(&self, message: &str);
}

/// Workspace backed by configured roots and an external editor command
#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    roots: Vec<PathBuf>,
    editor_command: Option<String>,
}

impl LocalWorkspace {
    /// Create a workspace
    ///
    /// `editor_command` may contain `{path}` and `{line}` placeholders; the
    /// line is substituted 1-based, as editors expect on the command line.
    ///
    /// # Examples
    ///
    /// ```
    /// use memchat::workspace::{LocalWorkspace, Workspace};
    /// use std::path::PathBuf;
    ///
    /// let ws = LocalWorkspace::new(vec![PathBuf::from("/project")], None);
    /// assert_eq!(ws.roots(), vec![PathBuf::from("/project")]);
    /// ```
    pub fn new(roots: Vec<PathBuf>, editor_command: Option<String>) -> Self {
        Self {
            roots,
            editor_command,
        }
    }

    /// Expand the editor command template into program and arguments
    fn editor_invocation(template: &str, path: &Path, line: Option<u32>) -> Option<Vec<String>> {
        let path = path.to_string_lossy();
        let line = line.map(|l| l + 1).unwrap_or(1).to_string();
        let parts: Vec<String> = template
            .split_whitespace()
            .map(|part| part.replace("{path}", &path).replace("{line}", &line))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts)
        }
    }
}

impl Workspace for LocalWorkspace {
    fn roots(&self) -> Vec<PathBuf> {
        self.roots.clone()
    }

    fn reveal(&self, path: &Path, line: Option<u32>) -> Result<()> {
        let Some(template) = &self.editor_command else {
            tracing::info!(path = %path.display(), line = ?line, "Reveal requested (no editor command configured)");
            return Ok(());
        };

        let parts = Self::editor_invocation(template, path, line).ok_or_else(|| {
            MemchatError::Workspace("workspace.editor_command is empty".to_string())
        })?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            MemchatError::Workspace("Editor launch requires a Tokio runtime".to_string())
        })?;

        tracing::debug!(command = ?parts, "Launching editor");
        let mut child = Command::new(&parts[0])
            .args(&parts[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| {
                MemchatError::Workspace(format!("Failed to launch editor `{}`: {}", parts[0], e))
            })?;

        // Reap the editor so finished launches do not linger as zombies
        let program = parts[0].clone();
        runtime.spawn(async move {
            match child.wait().await {
                Ok(status) if !status.success() => {
                    tracing::warn!(editor = %program, %status, "Editor command exited unsuccessfully");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(editor = %program, "Failed to wait for editor: {}", e),
            }
        });
        Ok(())
    }

    fn show_error(&self, message: &str) {
        tracing::warn!("{}", message);
        eprintln!("{} {}", "error:".red().bold(), message);
    }
}
