#![allow(deprecated)]

//! Binary-level tests for the memchat CLI
//!
//! Every test points `--config` at a temporary file and strips `MEMCHAT_*`
//! variables so the developer's environment cannot leak in.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

const UNREACHABLE: &str = "http://127.0.0.1:9";

fn memchat(config_path: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("memchat").unwrap();
    for var in [
        "MEMCHAT_API_URL",
        "MEMCHAT_CLIENT_ID",
        "MEMCHAT_TIMEOUT_SECONDS",
        "MEMCHAT_API_KEY",
        "MEMCHAT_EDITOR",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.arg("--config").arg(config_path);
    cmd
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("memchat").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("health"));
}

/// A bare directive is answered locally even when the backend is down
#[test]
fn test_ask_bare_directive_needs_no_backend() {
    let (_dir, config_path) = common::temp_config_file("backend:\n  client_id: cli-test\n");

    memchat(&config_path)
        .args(["--api-url", UNREACHABLE, "ask", "@source"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Please add a question after @source"));
}

/// An unreachable backend is reported in the reply, not as a failure
#[test]
fn test_ask_unreachable_backend_prints_network_message() {
    let (_dir, config_path) = common::temp_config_file(
        "backend:\n  client_id: cli-test\n  timeout_seconds: 2\n",
    );

    memchat(&config_path)
        .args(["--api-url", UNREACHABLE, "ask", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("couldn't reach the memory backend"));
}

#[test]
fn test_ask_requires_client_id() {
    let (_dir, config_path) = common::temp_config_file("backend:\n  timeout_seconds: 5\n");

    memchat(&config_path)
        .args(["ask", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("client_id must be set"));
}

#[test]
fn test_client_id_flag_satisfies_requirement() {
    let (_dir, config_path) = common::temp_config_file("backend:\n  timeout_seconds: 5\n");

    memchat(&config_path)
        .args(["--client-id", "flag-client", "--api-url", UNREACHABLE, "ask", "@source"])
        .assert()
        .success();
}

/// The missing-config warning is emitted once logging is up
#[test]
fn test_missing_config_file_is_logged() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("absent.yaml");

    memchat(&missing)
        .args(["--client-id", "cli-test", "--api-url", UNREACHABLE, "ask", "@source"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_invalid_base_url_scheme_is_rejected() {
    let (_dir, config_path) = common::temp_config_file(
        "backend:\n  base_url: \"ftp://example.com\"\n  client_id: cli-test\n",
    );

    memchat(&config_path)
        .arg("health")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must use http or https"));
}

#[test]
fn test_timeout_out_of_range_is_rejected() {
    let (_dir, config_path) = common::temp_config_file(
        "backend:\n  client_id: cli-test\n  timeout_seconds: 0\n",
    );

    memchat(&config_path)
        .arg("health")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be greater than 0"));
}

#[test]
fn test_lines_requires_file() {
    let (_dir, config_path) = common::temp_config_file("backend:\n  client_id: cli-test\n");

    memchat(&config_path)
        .args(["ask", "hello", "--lines", "1-2"])
        .assert()
        .failure();
}

#[test]
fn test_health_unreachable_fails() {
    let (_dir, config_path) = common::temp_config_file(
        "backend:\n  client_id: cli-test\n  timeout_seconds: 2\n",
    );

    memchat(&config_path)
        .args(["--api-url", UNREACHABLE, "health"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("unhealthy"));
}

#[test]
fn test_register_requires_api_key() {
    let (_dir, config_path) = common::temp_config_file("backend:\n  client_id: cli-test\n");

    memchat(&config_path)
        .args(["--api-url", UNREACHABLE, "register"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key is required"));
}

/// `serve` prefills the question and exits when stdin closes
#[test]
fn test_serve_speaks_ndjson_on_stdout() {
    let (dir, config_path) = common::temp_config_file("backend:\n  client_id: cli-test\n");

    memchat(&config_path)
        .args(["--api-url", UNREACHABLE, "serve", "--question", "what changed?"])
        .arg("--workspace")
        .arg(dir.path())
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""type":"addMessage""#))
        .stdout(predicate::str::contains(
            r#"{"type":"setInput","message":"what changed?"}"#,
        ));
}

#[tokio::test]
async fn test_summarize_json_against_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages/summarize"))
        .and(query_param("client_id", "cli-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["everything", ["drive:doc"]])))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, config_path) = common::temp_config_file("backend:\n  client_id: cli-test\n");

    let output = memchat(&config_path)
        .args(["--api-url", server.uri().as_str(), "summarize", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let reply: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reply["role"], "assistant");
    assert_eq!(reply["content"], "everything");
    assert_eq!(reply["sources"][0]["content"], "drive:doc");
}
