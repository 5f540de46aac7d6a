//! Integration tests for one-shot review mode against a mock server.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REVIEW_BODY: &str = "## Review\n\n- Looks good.\n";

#[tokio::test]
async fn test_review_file_prints_response() {
    let mock_server = MockServer::start().await;
    let dir = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/ai/get-review"))
        .and(body_json(serde_json::json!({"code": "fn main() {}\n"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(REVIEW_BODY))
        .expect(1)
        .mount(&mock_server)
        .await;

    let file = dir.path().join("snippet.rs");
    fs::write(&file, "fn main() {}\n").unwrap();

    cargo_bin_cmd!("revu")
        .env("REVU_HOME", dir.path())
        .args(["--server-url", &mock_server.uri(), "review"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Looks good."));
}

#[tokio::test]
async fn test_review_stdin_prints_response() {
    let mock_server = MockServer::start().await;
    let dir = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/ai/get-review"))
        .and(body_json(serde_json::json!({"code": "let x = 1;\n"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(REVIEW_BODY))
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("revu")
        .env("REVU_HOME", dir.path())
        .args(["--server-url", &mock_server.uri(), "review"])
        .write_stdin("let x = 1;\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Looks good."));
}

#[tokio::test]
async fn test_piped_input_without_subcommand_reviews() {
    let mock_server = MockServer::start().await;
    let dir = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/ai/get-review"))
        .respond_with(ResponseTemplate::new(200).set_body_string(REVIEW_BODY))
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("revu")
        .env("REVU_HOME", dir.path())
        .args(["--server-url", &mock_server.uri()])
        .write_stdin("let x = 1;\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Looks good."));
}

#[tokio::test]
async fn test_review_server_error_prints_fallback() {
    let mock_server = MockServer::start().await;
    let dir = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/ai/get-review"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("revu")
        .env("REVU_HOME", dir.path())
        .args(["--server-url", &mock_server.uri(), "review"])
        .write_stdin("let x = 1;\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("⚠️ Error connecting to server"));
}

#[test]
fn test_review_unreachable_server_prints_fallback() {
    let dir = tempdir().unwrap();

    // Port 9 (discard) is never listening
    cargo_bin_cmd!("revu")
        .env("REVU_HOME", dir.path())
        .args(["--server-url", "http://127.0.0.1:9", "review"])
        .write_stdin("let x = 1;\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("⚠️ Error connecting to server"));
}

#[test]
fn test_review_empty_stdin_fails() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("revu")
        .env("REVU_HOME", dir.path())
        .args(["review"])
        .write_stdin("   \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No code provided"));
}

#[tokio::test]
async fn test_env_server_url_is_used() {
    let mock_server = MockServer::start().await;
    let dir = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/ai/get-review"))
        .respond_with(ResponseTemplate::new(200).set_body_string(REVIEW_BODY))
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("revu")
        .env("REVU_HOME", dir.path())
        .env("REVU_SERVER_URL", mock_server.uri())
        .arg("review")
        .write_stdin("let x = 1;\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Looks good."));
}

#[tokio::test]
async fn test_server_url_flag_beats_env() {
    let mock_server = MockServer::start().await;
    let dir = tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/ai/get-review"))
        .respond_with(ResponseTemplate::new(200).set_body_string(REVIEW_BODY))
        .expect(1)
        .mount(&mock_server)
        .await;

    cargo_bin_cmd!("revu")
        .env("REVU_HOME", dir.path())
        .env("REVU_SERVER_URL", "http://127.0.0.1:9")
        .args(["--server-url", &mock_server.uri(), "review"])
        .write_stdin("let x = 1;\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Looks good."));
}
