//! End-to-end host bridge tests
//!
//! A real `QueryClient` talks to a `wiremock` backend while the test plays
//! the rendering surface over the in-memory `ChannelTransport`, asserting
//! the exact notification sequence the surface observes.

mod common;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use memchat::bridge::{
    ChannelTransport, ChannelTransportHandle, HostBridge, HostCommand, HostNotification,
    SurfaceIntent,
};
use memchat::chat::{ChatMessage, Role, WELCOME_MESSAGE};
use memchat::client::directive::CLARIFICATION_MESSAGE;
use memchat::client::response::EMPTY_REPLY_FALLBACK;
use memchat::client::{QueryClient, NOT_FOUND_MESSAGE};
use memchat::error::Result;
use memchat::workspace::Workspace;

use common::backend_config;

/// Workspace that records what the bridge asked of it
#[derive(Default)]
struct RecordingWorkspace {
    roots: Vec<PathBuf>,
    revealed: Mutex<Vec<(PathBuf, Option<u32>)>>,
    errors: Mutex<Vec<String>>,
}

impl Workspace for RecordingWorkspace {
    fn roots(&self) -> Vec<PathBuf> {
        self.roots.clone()
    }

    fn reveal(&self, path: &Path, line: Option<u32>) -> Result<()> {
        self.revealed
            .lock()
            .unwrap()
            .push((path.to_path_buf(), line));
        Ok(())
    }

    fn show_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

type Running = JoinHandle<HostBridge>;

fn start(mut bridge: HostBridge) -> (Running, ChannelTransportHandle) {
    let (mut transport, handle) = ChannelTransport::new();
    let task = tokio::spawn(async move {
        bridge.attach(&mut transport).await.expect("bridge loop");
        bridge
    });
    (task, handle)
}

async fn stop(task: Running, handle: ChannelTransportHandle) -> HostBridge {
    drop(handle);
    task.await.expect("bridge task")
}

async fn next(handle: &mut ChannelTransportHandle) -> HostNotification {
    tokio::time::timeout(Duration::from_secs(10), handle.next_notification())
        .await
        .expect("timed out waiting for notification")
        .expect("transport closed")
        .expect("undecodable notification")
}

async fn next_message(handle: &mut ChannelTransportHandle) -> ChatMessage {
    match next(handle).await {
        HostNotification::AddMessage { message } => message,
        other => panic!("expected addMessage, got {:?}", other),
    }
}

/// Send `text` and return the assistant reply, asserting the ordering
async fn round_trip(handle: &mut ChannelTransportHandle, text: &str) -> ChatMessage {
    handle
        .send_intent(&SurfaceIntent::SendMessage {
            message: text.to_string(),
            context: None,
        })
        .unwrap();

    let user = next_message(handle).await;
    assert_eq!(user.role, Role::User);
    assert_eq!(user.content, text);
    assert_eq!(next(handle).await, HostNotification::ShowTyping);
    assert_eq!(next(handle).await, HostNotification::HideTyping);
    let reply = next_message(handle).await;
    assert_eq!(reply.role, Role::Assistant);
    reply
}

fn bridge_for(server: &MockServer, workspace: Arc<RecordingWorkspace>) -> HostBridge {
    let client = QueryClient::new(&backend_config(&server.uri())).expect("client");
    HostBridge::new(Arc::new(client), workspace)
}

#[tokio::test]
async fn test_conversation_over_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages/query"))
        .and(query_param("content", "a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["a-reply", []])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/messages/query"))
        .and(query_param("content", "b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "b-reply"})))
        .expect(1)
        .mount(&server)
        .await;

    let (task, mut handle) = start(bridge_for(&server, Arc::default()));
    assert_eq!(next_message(&mut handle).await.content, WELCOME_MESSAGE);

    assert_eq!(round_trip(&mut handle, "a").await.content, "a-reply");
    assert_eq!(round_trip(&mut handle, "b").await.content, "b-reply");

    let bridge = stop(task, handle).await;
    let contents: Vec<&str> = bridge
        .session()
        .history()
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(
        contents,
        vec![WELCOME_MESSAGE, "a", "a-reply", "b", "b-reply"]
    );
}

#[tokio::test]
async fn test_bare_directive_is_answered_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (task, mut handle) = start(bridge_for(&server, Arc::default()));
    next_message(&mut handle).await;

    let reply = round_trip(&mut handle, "@source   ").await;
    assert_eq!(reply.content, CLARIFICATION_MESSAGE);

    stop(task, handle).await;
}

#[tokio::test]
async fn test_blank_object_reply_keeps_sources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages/query"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "  ", "sources": ["fileA:1-3"]})),
        )
        .mount(&server)
        .await;

    let (task, mut handle) = start(bridge_for(&server, Arc::default()));
    next_message(&mut handle).await;

    let reply = round_trip(&mut handle, "anything?").await;
    assert_eq!(reply.content, EMPTY_REPLY_FALLBACK);
    let sources = reply.sources.expect("sources");
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].content.as_deref(), Some("fileA:1-3"));

    stop(task, handle).await;
}

#[tokio::test]
async fn test_not_found_reaches_surface_as_guidance() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages/query"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (task, mut handle) = start(bridge_for(&server, Arc::default()));
    next_message(&mut handle).await;

    let reply = round_trip(&mut handle, "hello").await;
    assert_eq!(reply.content, NOT_FOUND_MESSAGE);

    let bridge = stop(task, handle).await;
    assert!(!bridge.session().is_busy());
}

#[tokio::test]
async fn test_host_commands_reach_surface() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages/summarize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["all of it", []])))
        .expect(1)
        .mount(&server)
        .await;

    let bridge = bridge_for(&server, Arc::default());
    let commands = bridge.commands();
    let (task, mut handle) = start(bridge);
    next_message(&mut handle).await;

    commands.send(HostCommand::AskQuestion("prefilled".to_string()));
    assert_eq!(
        next(&mut handle).await,
        HostNotification::SetInput {
            message: "prefilled".to_string()
        }
    );

    commands.send(HostCommand::Summarize);
    assert_eq!(next_message(&mut handle).await.role, Role::User);
    assert_eq!(next(&mut handle).await, HostNotification::ShowTyping);
    assert_eq!(next(&mut handle).await, HostNotification::HideTyping);
    assert_eq!(next_message(&mut handle).await.content, "all of it");

    commands.send(HostCommand::ClearChat);
    assert_eq!(next(&mut handle).await, HostNotification::ClearChat);
    assert_eq!(next_message(&mut handle).await.content, WELCOME_MESSAGE);

    let bridge = stop(task, handle).await;
    assert_eq!(bridge.session().history().len(), 1);
}

#[tokio::test]
async fn test_open_file_resolves_against_first_root() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/lib.rs"), "pub fn a() {}\n").unwrap();

    let workspace = Arc::new(RecordingWorkspace {
        roots: vec![dir.path().to_path_buf()],
        ..Default::default()
    });
    let server = MockServer::start().await;
    let (task, mut handle) = start(bridge_for(&server, workspace.clone()));
    next_message(&mut handle).await;

    handle
        .send_raw(r#"{"type":"openFile","path":"src/lib.rs","line":5}"#)
        .unwrap();
    handle
        .send_raw(r#"{"type":"openFile","path":"src/missing.rs"}"#)
        .unwrap();

    let bridge = stop(task, handle).await;

    let revealed = workspace.revealed.lock().unwrap().clone();
    assert_eq!(revealed.len(), 1);
    assert!(revealed[0].0.ends_with("src/lib.rs"));
    assert_eq!(revealed[0].1, Some(4));

    let errors = workspace.errors.lock().unwrap().clone();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("src/missing.rs"));

    assert_eq!(bridge.session().history().len(), 1);
}

#[tokio::test]
async fn test_reattached_surface_sees_same_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("remembered")))
        .mount(&server)
        .await;

    let (task, mut handle) = start(bridge_for(&server, Arc::default()));
    next_message(&mut handle).await;
    round_trip(&mut handle, "remember this").await;
    let bridge = stop(task, handle).await;

    let (task, mut handle) = start(bridge);
    let replayed = [
        next_message(&mut handle).await,
        next_message(&mut handle).await,
        next_message(&mut handle).await,
    ];
    let contents: Vec<&str> = replayed.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec![WELCOME_MESSAGE, "remember this", "remembered"]);

    stop(task, handle).await;
}
