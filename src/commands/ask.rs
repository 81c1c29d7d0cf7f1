//! One-shot queries from the command line
//!
//! `memchat ask` and `memchat summarize` go through the same
//! [`QueryClient`] as the chat host, so directive handling, response
//! normalization and failure translation are identical. Neither command
//! fails on a backend problem: the translated assistant message is printed.

use std::path::Path;

use colored::Colorize;

use crate::chat::{ChatMessage, FileContext};
use crate::client::{MemoryBackend, QueryClient};
use crate::config::Config;
use crate::error::{MemchatError, Result};

/// Ask one question, optionally anchored to (part of) a file
///
/// # Errors
///
/// Returns error if no client id is configured, or the context file or
/// line range is invalid.
pub async fn run_ask(
    config: &Config,
    text: &str,
    file: Option<&Path>,
    lines: Option<&str>,
    json: bool,
) -> Result<()> {
    config.require_client_id()?;

    let context = match file {
        Some(path) => {
            let range = lines.map(parse_line_range).transpose()?;
            Some(build_file_context(path, range)?)
        }
        None => None,
    };

    let client = QueryClient::new(&config.backend)?;
    let reply = client.query(text, context.as_ref()).await;
    println!("{}", render_reply(&reply, json)?);
    Ok(())
}

/// Ask the backend to summarize everything it remembers
///
/// # Errors
///
/// Returns error if no client id is configured
pub async fn run_summarize(config: &Config, json: bool) -> Result<()> {
    config.require_client_id()?;
    let client = QueryClient::new(&config.backend)?;
    let reply = client.summarize().await;
    println!("{}", render_reply(&reply, json)?);
    Ok(())
}

/// Parse `a-b` (or a single `a`) into a 1-based inclusive range
///
/// # Errors
///
/// Returns [`MemchatError::Config`] for non-numeric bounds, line 0, or a
/// start after the end.
///
/// # Examples
///
/// ```
/// use memchat::commands::ask::parse_line_range;
///
/// assert_eq!(parse_line_range("10-20").unwrap(), (10, 20));
/// assert_eq!(parse_line_range("7").unwrap(), (7, 7));
/// assert!(parse_line_range("5-2").is_err());
/// ```
pub fn parse_line_range(spec: &str) -> Result<(u32, u32)> {
    let invalid = || MemchatError::Config(format!("Invalid line range: {}", spec));

    let (start, end) = match spec.split_once('-') {
        Some((a, b)) => (a.trim(), b.trim()),
        None => (spec.trim(), spec.trim()),
    };
    let start: u32 = start.parse().map_err(|_| invalid())?;
    let end: u32 = end.parse().map_err(|_| invalid())?;

    if start == 0 || start > end {
        return Err(invalid().into());
    }
    Ok((start, end))
}

/// Read a file into a [`FileContext`], keeping only `range` when given
///
/// # Errors
///
/// Returns error if the file cannot be read or the range starts past the
/// end of the file.
pub fn build_file_context(path: &Path, range: Option<(u32, u32)>) -> Result<FileContext> {
    let contents = std::fs::read_to_string(path).map_err(MemchatError::Io)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let file_path = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string();

    let Some((start, end)) = range else {
        return Ok(FileContext {
            file_name,
            file_path,
            content: contents,
            line_start: None,
            line_end: None,
        });
    };

    let total = contents.lines().count() as u32;
    if start > total {
        return Err(MemchatError::Config(format!(
            "Line {} is past the end of {} ({} lines)",
            start, file_name, total
        ))
        .into());
    }
    let end = end.min(total);
    let content = contents
        .lines()
        .skip((start - 1) as usize)
        .take((end - start + 1) as usize)
        .collect::<Vec<_>>()
        .join("\n");

    Ok(FileContext {
        file_name,
        file_path,
        content,
        line_start: Some(start),
        line_end: Some(end),
    })
}

/// Format a reply for the terminal, or as a JSON chat message
///
/// # Errors
///
/// Returns error if JSON serialization fails
pub fn render_reply(message: &ChatMessage, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(message).map_err(MemchatError::Serialization)?);
    }

    let mut out = format!("{} {}", "memory:".cyan().bold(), message.content);
    if let Some(sources) = &message.sources {
        out.push_str(&format!("\n\n{}", "Sources:".bold()));
        for (i, source) in sources.iter().enumerate() {
            let excerpt = source.content.as_deref().unwrap_or("");
            out.push_str(&format!("\n  [{}] {} {}", i + 1, source.path.dimmed(), excerpt));
        }
    }
    Ok(out)
}
