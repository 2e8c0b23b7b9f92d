//! Integration tests for UMA Gate CLI commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

type Seen = Arc<Mutex<Vec<(Option<String>, HashMap<String, String>)>>>;

/// Token endpoint answering `status`, recording the Authorization header and
/// form of every query. The runtime must outlive the commands under test.
fn start_token_endpoint(status: u16) -> (tokio::runtime::Runtime, String, Seen) {
    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Form, Router};

    async fn token(
        State((status, seen)): State<(u16, Seen)>,
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> StatusCode {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        seen.lock().unwrap().push((authorization, form));
        StatusCode::from_u16(status).unwrap()
    }

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/token", post(token))
        .with_state((status, seen.clone()));

    let listener = runtime
        .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
        .unwrap();
    let url = format!("http://{}/token", listener.local_addr().unwrap());
    runtime.spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (runtime, url, seen)
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// Address nothing listens on
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/token", addr)
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("umagate"));
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("permission"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_permission_text() {
    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("permission")
        .arg("/api/v1/shop/orders/read")
        .assert()
        .success()
        .stdout(predicate::str::contains("/orders#read"))
        .stdout(predicate::str::contains("Resource: orders"))
        .stdout(predicate::str::contains("Scope: read"));
}

#[test]
fn test_permission_ignores_extra_segments() {
    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("permission")
        .arg("/api/v1/shop/orders/read/42/items")
        .assert()
        .success()
        .stdout(predicate::str::contains("/orders#read"));
}

#[test]
fn test_permission_json() {
    let mut cmd = Command::cargo_bin("umagate").unwrap();
    let output = cmd
        .arg("permission")
        .arg("/api/v1/shop/orders/read")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["permission"], "/orders#read");
    assert_eq!(value["resource"], "orders");
    assert_eq!(value["scope"], "read");
}

#[test]
fn test_permission_custom_prefix_depth() {
    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("permission")
        .arg("/gw/invoices/approve")
        .arg("--prefix-depth")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("/invoices#approve"));
}

#[test]
fn test_permission_short_path_fails() {
    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("permission")
        .arg("/api/orders")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Invalid path format"));
}

#[test]
fn test_permission_short_path_json_error() {
    let mut cmd = Command::cargo_bin("umagate").unwrap();
    let output = cmd
        .arg("permission")
        .arg("/a/b/c/orders")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["error"], "invalid_path_format");
    assert_eq!(value["status"], 400);
}

#[test]
fn test_validate_complete_config() {
    let file = config_file(
        r#"
        [gate]
        auth_server_url = "https://idp.example.com/realms/shop/protocol/openid-connect/token"
        client_id = "orders-api"
        timeout_ms = 2500
        "#,
    );

    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("validate")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("orders-api"))
        .stdout(predicate::str::contains("2500ms"));
}

#[test]
fn test_validate_accepts_legacy_names() {
    let file = config_file(
        r#"
        [gate]
        keycloakURL = "http://localhost:8080/token"
        keycloakClientId = "orders-api"
        "#,
    );

    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("validate")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_validate_incomplete_config() {
    let file = config_file(
        r#"
        [gate]
        auth_server_url = "http://localhost:8080/token"
        "#,
    );

    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("validate")
        .arg(file.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Configuration is incomplete"))
        .stdout(predicate::str::contains("client_id is empty"));
}

#[test]
fn test_validate_malformed_toml() {
    let file = config_file("[gate\nclient_id = ");

    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("validate")
        .arg(file.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Configuration is invalid"));
}

#[test]
fn test_validate_missing_file() {
    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("validate")
        .arg("/nonexistent/umagate.toml")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Configuration is invalid"));
}

#[test]
fn test_check_unreachable_server_denies() {
    let file = config_file(&format!(
        "[gate]\nauth_server_url = \"{}\"\nclient_id = \"orders-api\"\n",
        closed_port_url()
    ));

    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("check")
        .arg("--config")
        .arg(file.path())
        .arg("--token")
        .arg("abc.def")
        .arg("/api/v1/shop/orders/read")
        .assert()
        .failure()
        .stdout(predicate::str::contains("DENIED"))
        .stdout(predicate::str::contains("upstream_request"))
        .stdout(predicate::str::contains("401"));
}

#[test]
fn test_check_short_path_skips_query() {
    let file = config_file(&format!(
        "[gate]\nauth_server_url = \"{}\"\nclient_id = \"orders-api\"\n",
        closed_port_url()
    ));

    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("check")
        .arg("--config")
        .arg(file.path())
        .arg("--token")
        .arg("abc.def")
        .arg("/orders")
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid_path_format"))
        .stdout(predicate::str::contains("400"));
}

#[test]
fn test_check_missing_config_file() {
    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("check")
        .arg("--config")
        .arg("/nonexistent/umagate.toml")
        .arg("--token")
        .arg("abc.def")
        .arg("/api/v1/shop/orders/read")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_check_granted() {
    let (_runtime, url, seen) = start_token_endpoint(200);
    let file = config_file(&format!(
        "[gate]\nauth_server_url = \"{}\"\nclient_id = \"orders-api\"\n",
        url
    ));

    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("check")
        .arg("--config")
        .arg(file.path())
        .arg("--token")
        .arg("abc.def")
        .arg("/api/v1/shop/orders/read")
        .assert()
        .success()
        .stdout(predicate::str::contains("GRANTED"))
        .stdout(predicate::str::contains("/orders#read"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (authorization, form) = &seen[0];
    assert_eq!(authorization.as_deref(), Some("Bearer abc.def"));
    assert_eq!(form["permission"], "/orders#read");
    assert_eq!(form["audience"], "orders-api");
}

#[test]
fn test_check_denied_by_server() {
    let (_runtime, url, seen) = start_token_endpoint(403);
    let file = config_file(&format!(
        "[gate]\nauth_server_url = \"{}\"\nclient_id = \"orders-api\"\n",
        url
    ));

    let mut cmd = Command::cargo_bin("umagate").unwrap();
    cmd.arg("check")
        .arg("--config")
        .arg(file.path())
        .arg("--token")
        .arg("abc.def")
        .arg("/api/v1/shop/orders/delete")
        .assert()
        .failure()
        .stdout(predicate::str::contains("DENIED"))
        .stdout(predicate::str::contains("access_denied"));

    assert_eq!(seen.lock().unwrap().len(), 1);
}
