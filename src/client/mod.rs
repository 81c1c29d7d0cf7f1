//! Memory backend client
//!
//! [`QueryClient`] issues one HTTP call per question to the memory backend
//! and always answers with an assistant [`ChatMessage`]. Failures never
//! escape [`MemoryBackend::query`]: a 404 becomes configuration guidance,
//! everything else (refused connection, timeout, 5xx) becomes a
//! network-failure message carrying the low-level error text.
//!
//! # Endpoints
//!
//! - `POST /messages/query?client_id=…&content=…` (chat questions)
//! - `POST /messages/summarize?client_id=…` (summarize everything)
//! - `POST /client?client_id=…&api_key=…` (registration)
//! - `GET /` (health probe, `{"status": "ok"}`)
//!
//! There are no retries. Each call is bounded by the configured timeout.

pub mod directive;
pub mod response;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::chat::{ChatMessage, FileContext};
use crate::config::BackendConfig;
use crate::error::{MemchatError, Result};
use crate::sources::resolve_sources;

use directive::{compose_request, ComposedRequest, CLARIFICATION_MESSAGE};
use response::normalize_body;

/// Reply used when the backend answers 404 for this client
pub const NOT_FOUND_MESSAGE: &str = "The memory backend does not recognize this client (404). \
Check the backend URL and client ID in your settings, or register this client with \
`memchat register`.";

/// Build the reply used for unreachable, timed out or failing backends
///
/// # Examples
///
/// ```
/// use memchat::client::network_failure_message;
///
/// let message = network_failure_message("connection refused");
/// assert!(message.contains("connection refused"));
/// ```
pub fn network_failure_message(detail: &str) -> String {
    format!(
        "I couldn't reach the memory backend: {}. Check that it is running and try again.",
        detail
    )
}

/// Something that can answer chat questions from memory
///
/// Implementations must not fail: every outcome is an assistant message.
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// Answer `text`, optionally anchored to an editor `context`
    async fn query(&self, text: &str, context: Option<&FileContext>) -> ChatMessage;

    /// Summarize everything the backend remembers for this client
    async fn summarize(&self) -> ChatMessage;
}

/// Result of the health probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub healthy: bool,
    /// `ok`, or why the probe failed
    pub detail: String,
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    #[serde(default)]
    status: String,
}

/// HTTP client for the memory backend
#[derive(Debug, Clone)]
pub struct QueryClient {
    client: Client,
    base_url: String,
    client_id: String,
}

impl QueryClient {
    /// Create a client from backend configuration
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use memchat::client::QueryClient;
    /// use memchat::config::BackendConfig;
    ///
    /// let client = QueryClient::new(&BackendConfig::default()).unwrap();
    /// assert_eq!(client.base_url(), "http://localhost:8000");
    /// ```
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("memchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MemchatError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized memory backend client: base_url={}, timeout={}s",
            config.base_url,
            config.timeout_seconds
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST with query parameters and return the body of a 2xx response
    async fn post(&self, path: &str, params: &[(&str, &str)]) -> Result<String> {
        let url = self.endpoint(path);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .query(params)
            .send()
            .await
            .map_err(MemchatError::Http)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MemchatError::BackendNotFound(self.client_id.clone()).into());
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MemchatError::Backend(format!("{} {}", status, error_text.trim())).into());
        }

        Ok(response.text().await.map_err(MemchatError::Http)?)
    }

    /// Turn a successful body into an assistant message
    fn reply_message(body: &str) -> ChatMessage {
        let normalized = normalize_body(body);
        ChatMessage::assistant(normalized.text).with_sources(resolve_sources(&normalized.sources))
    }

    /// Turn any failure into an assistant message
    fn failure_message(err: anyhow::Error) -> ChatMessage {
        if let Some(MemchatError::BackendNotFound(client_id)) = err.downcast_ref::<MemchatError>() {
            tracing::warn!(client_id = %client_id, "Memory backend does not know this client");
            return ChatMessage::assistant(NOT_FOUND_MESSAGE);
        }
        let detail = format!("{:#}", err);
        tracing::warn!("Memory backend call failed: {}", detail);
        ChatMessage::assistant(network_failure_message(&detail))
    }

    fn settle(result: Result<String>) -> ChatMessage {
        match result {
            Ok(body) => Self::reply_message(&body),
            Err(err) => Self::failure_message(err),
        }
    }

    /// Probe `GET /`
    ///
    /// Never fails; an unreachable backend is reported as unhealthy.
    pub async fn health(&self) -> HealthStatus {
        let url = self.endpoint("/");
        let unhealthy = |detail: String| HealthStatus {
            healthy: false,
            detail,
        };

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return unhealthy(format!("{:#}", anyhow::Error::from(e))),
        };

        let status = response.status();
        if !status.is_success() {
            return unhealthy(format!("status {}", status));
        }

        match response.json::<HealthBody>().await {
            Ok(body) if body.status == "ok" => HealthStatus {
                healthy: true,
                detail: "ok".to_string(),
            },
            Ok(body) => unhealthy(format!("status field is {:?}", body.status)),
            Err(e) => unhealthy(format!("unexpected health body: {}", e)),
        }
    }

    /// Register this client with the backend
    ///
    /// # Errors
    ///
    /// [`MemchatError::ClientAlreadyRegistered`] on 409, [`MemchatError::Backend`]
    /// on any other non-success status, [`MemchatError::Http`] when the
    /// backend cannot be reached.
    pub async fn register(&self, api_key: &str) -> Result<()> {
        let url = self.endpoint("/client");
        tracing::info!("Registering client {} at {}", self.client_id, url);

        let response = self
            .client
            .post(&url)
            .query(&[("client_id", self.client_id.as_str()), ("api_key", api_key)])
            .send()
            .await
            .map_err(MemchatError::Http)?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Err(MemchatError::ClientAlreadyRegistered(self.client_id.clone()).into());
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MemchatError::Backend(format!(
                "registration failed with {}: {}",
                status,
                error_text.trim()
            ))
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl MemoryBackend for QueryClient {
    async fn query(&self, text: &str, context: Option<&FileContext>) -> ChatMessage {
        let (body, wants_sources) = match compose_request(text, context) {
            ComposedRequest::NeedsClarification => {
                tracing::debug!("Directive without a question; not contacting backend");
                return ChatMessage::assistant(CLARIFICATION_MESSAGE);
            }
            ComposedRequest::Send {
                body,
                wants_sources,
            } => (body, wants_sources),
        };

        tracing::debug!(
            wants_sources,
            has_context = context.is_some(),
            "Querying memory backend"
        );

        let result = self
            .post(
                "/messages/query",
                &[
                    ("client_id", self.client_id.as_str()),
                    ("content", body.as_str()),
                ],
            )
            .await;
        Self::settle(result)
    }

    async fn summarize(&self) -> ChatMessage {
        tracing::debug!("Requesting memory summary");
        let result = self
            .post(
                "/messages/summarize",
                &[("client_id", self.client_id.as_str())],
            )
            .await;
        Self::settle(result)
    }
}
