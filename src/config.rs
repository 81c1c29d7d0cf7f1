//! Configuration management for memchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! The backend base URL and client identifier are treated as opaque,
//! externally supplied strings. Nothing here generates or rotates a
//! client identifier.

use crate::error::{MemchatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Main configuration structure for memchat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Memory backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Workspace roots and file reveal settings
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// File this configuration was read from; `None` means built-in defaults
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Memory backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the memory backend (e.g. `http://localhost:8000`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Stable per-installation client identifier sent with every query
    #[serde(default)]
    pub client_id: String,

    /// Upper bound for a single backend call (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// API key forwarded by `register`; never sent with queries
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            client_id: String::new(),
            timeout_seconds: default_timeout_seconds(),
            api_key: None,
        }
    }
}

/// Workspace configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Workspace roots; the first one is used to resolve relative paths.
    /// Empty means "use the current directory".
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Program used to reveal a file, with `{path}` and `{line}` placeholders
    /// (e.g. `code --goto {path}:{line}`). When unset, reveals are only logged.
    #[serde(default)]
    pub editor_command: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_format: bool,
}

fn default_log_level() -> String {
    "memchat=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// When `path` is the default and does not exist, the platform config
    /// directory (`~/.config/memchat/config.yaml` on Linux) is tried next.
    /// If no file is found, defaults are used and [`Config::source`] is
    /// `None`. Loading runs before logging is set up, so it logs nothing.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = match Self::locate(path) {
            Some(found) => {
                let mut config = Self::from_file(&found)?;
                config.source = Some(found);
                config
            }
            None => Self::default(),
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn locate(path: &str) -> Option<PathBuf> {
        let candidate = PathBuf::from(path);
        if candidate.exists() {
            return Some(candidate);
        }
        if path != DEFAULT_CONFIG_PATH {
            return None;
        }
        let dirs = directories::ProjectDirs::from("", "", "memchat")?;
        let fallback = dirs.config_dir().join("config.yaml");
        fallback.exists().then_some(fallback)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MemchatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| MemchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("MEMCHAT_API_URL") {
            tracing::debug!(url = %url, "Env override: MEMCHAT_API_URL");
            self.backend.base_url = url;
        }

        if let Ok(client_id) = std::env::var("MEMCHAT_CLIENT_ID") {
            self.backend.client_id = client_id;
        }

        if let Ok(timeout) = std::env::var("MEMCHAT_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(v) => self.backend.timeout_seconds = v,
                Err(_) => tracing::warn!("Invalid MEMCHAT_TIMEOUT_SECONDS: {}", timeout),
            }
        }

        if let Ok(api_key) = std::env::var("MEMCHAT_API_KEY") {
            self.backend.api_key = Some(api_key);
        }

        if let Ok(editor) = std::env::var("MEMCHAT_EDITOR") {
            self.workspace.editor_command = Some(editor);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(url) = &cli.api_url {
            self.backend.base_url = url.clone();
        }
        if let Some(client_id) = &cli.client_id {
            self.backend.client_id = client_id.clone();
        }
        if cli.json_logs {
            self.logging.json_format = true;
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// The client identifier is not checked here; commands that contact
    /// the backend call [`Config::require_client_id`].
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.backend.base_url).map_err(|e| {
            MemchatError::Config(format!(
                "backend.base_url is not a valid URL ({}): {}",
                self.backend.base_url, e
            ))
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(MemchatError::Config(format!(
                "backend.base_url must use http or https, got {}",
                parsed.scheme()
            ))
            .into());
        }

        if self.backend.timeout_seconds == 0 {
            return Err(MemchatError::Config(
                "backend.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.backend.timeout_seconds > 600 {
            return Err(MemchatError::Config(
                "backend.timeout_seconds must be less than or equal to 600".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Ensure a client identifier is configured
    ///
    /// # Errors
    ///
    /// Returns [`MemchatError::Config`] when the identifier is empty
    pub fn require_client_id(&self) -> Result<&str> {
        let id = self.backend.client_id.trim();
        if id.is_empty() {
            return Err(MemchatError::Config(
                "backend.client_id must be set (config file, MEMCHAT_CLIENT_ID or --client-id)"
                    .to_string(),
            )
            .into());
        }
        Ok(id)
    }

    /// Workspace roots with the current directory as fallback
    pub fn workspace_roots(&self) -> Vec<PathBuf> {
        if !self.workspace.roots.is_empty() {
            return self.workspace.roots.clone();
        }
        std::env::current_dir().map(|d| vec![d]).unwrap_or_default()
    }
}
