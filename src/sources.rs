//! Source resolution
//!
//! Two unrelated kinds of "where did this come from" live here:
//!
//! - [`resolve_sources`] turns the raw source strings returned by the
//!   memory backend into [`SourceReference`]s. The backend does not emit
//!   structured locations for generic queries, so the raw string is kept as
//!   the displayable excerpt and the path is a placeholder.
//! - [`resolve_workspace_path`] turns a path from an `openFile` intent into
//!   an existing file under the first workspace root.

use std::path::{Path, PathBuf};

use crate::chat::SourceReference;
use crate::error::{MemchatError, Result};

/// Path used for sources the backend cannot locate
pub const PLACEHOLDER_SOURCE_PATH: &str = "memory";

/// Map raw backend sources to references, preserving order
///
/// # Examples
///
/// ```
/// use memchat::sources::{resolve_sources, PLACEHOLDER_SOURCE_PATH};
///
/// let refs = resolve_sources(&["fileA:1-3".to_string()]);
/// assert_eq!(refs[0].path, PLACEHOLDER_SOURCE_PATH);
/// assert_eq!(refs[0].content.as_deref(), Some("fileA:1-3"));
/// assert!(resolve_sources(&[]).is_empty());
/// ```
pub fn resolve_sources(raw: &[String]) -> Vec<SourceReference> {
    raw.iter()
        .map(|s| SourceReference::new(PLACEHOLDER_SOURCE_PATH, None, None, Some(s.clone())))
        .collect()
}

/// Resolve `requested` against the first workspace root
///
/// Relative paths are joined to the root. Absolute paths are accepted only
/// when they point inside the root.
///
/// # Errors
///
/// Returns [`MemchatError::Workspace`] if no root is available, the path is
/// empty, does not exist, is not a file, or escapes the root.
pub fn resolve_workspace_path(roots: &[PathBuf], requested: &str) -> Result<PathBuf> {
    let root = roots
        .first()
        .ok_or_else(|| MemchatError::Workspace("No workspace folder is open".to_string()))?;

    let requested = requested.trim();
    if requested.is_empty() {
        return Err(MemchatError::Workspace("No file path was given".to_string()).into());
    }

    let candidate = root.join(requested);
    let canonical = candidate.canonicalize().map_err(|e| {
        MemchatError::Workspace(format!("Could not open {}: {}", requested, e))
    })?;

    let canonical_root = canonical_or_self(root);
    if !canonical.starts_with(&canonical_root) {
        return Err(MemchatError::Workspace(format!(
            "{} is outside the workspace",
            requested
        ))
        .into());
    }

    if !canonical.is_file() {
        return Err(MemchatError::Workspace(format!("{} is not a file", requested)).into());
    }

    Ok(canonical)
}

fn canonical_or_self(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
