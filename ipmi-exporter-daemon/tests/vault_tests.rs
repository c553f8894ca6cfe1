//! `VaultProvider` against a local axum server playing the KV endpoint.

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use serde_json::{Value, json};

use ipmi_exporter::vault::{CredentialProvider, VaultError, VaultProvider};
use ipmi_exporter_core::settings::VaultSettings;

const TOKEN: &str = "s.test-token";

async fn read_secret(
    Path(target): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    if headers.get("x-vault-token").and_then(|v| v.to_str().ok()) != Some(TOKEN) {
        return Err(StatusCode::FORBIDDEN);
    }
    match target.as_str() {
        "10.0.0.1" => Ok(Json(json!({
            "data": { "username": "admin", "password": "from-vault" }
        }))),
        "10.0.0.2" => Ok(Json(json!({ "data": { "username": "admin" } }))),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn read_policy() -> Json<Value> {
    Json(json!({ "data": { "username": "root", "password": "policy-leak" } }))
}

async fn never_answer() -> StatusCode {
    tokio::time::sleep(Duration::from_secs(30)).await;
    StatusCode::OK
}

async fn spawn_vault() -> SocketAddr {
    let app = Router::new()
        .route("/v1/kv/{target}", get(read_secret))
        .route("/v1/sys/{name}", get(read_policy))
        .route("/v1/slow/{target}", get(never_answer));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn token_file(token: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    // trailing newline must be trimmed
    writeln!(file, "{token}").unwrap();
    file
}

fn provider(addr: SocketAddr, token: &tempfile::NamedTempFile) -> VaultProvider {
    VaultProvider::new(&VaultSettings {
        enabled: true,
        address: format!("http://{addr}"),
        token_file: token.path().display().to_string(),
        ..VaultSettings::default()
    })
    .unwrap()
}

#[tokio::test]
async fn fetches_username_and_password() {
    // Given
    let addr = spawn_vault().await;
    let token = token_file(TOKEN);

    // When
    let creds = provider(addr, &token).fetch("10.0.0.1").await.unwrap();

    // Then
    assert_eq!(creds.username, "admin");
    assert_eq!(creds.password, "from-vault");
}

#[tokio::test]
async fn wrong_token_is_status_error() {
    let addr = spawn_vault().await;
    let token = token_file("s.wrong");

    let err = provider(addr, &token).fetch("10.0.0.1").await.unwrap_err();
    assert!(matches!(err, VaultError::Status { status: 403, .. }));
}

#[tokio::test]
async fn secret_without_password_is_missing_field() {
    let addr = spawn_vault().await;
    let token = token_file(TOKEN);

    let err = provider(addr, &token).fetch("10.0.0.2").await.unwrap_err();
    assert!(matches!(err, VaultError::MissingField { field: "password", .. }));
}

#[tokio::test]
async fn unreadable_token_file_is_reported() {
    let addr = spawn_vault().await;
    let provider = VaultProvider::new(&VaultSettings {
        enabled: true,
        address: format!("http://{addr}"),
        token_file: "/nonexistent/vault-token".to_owned(),
        ..VaultSettings::default()
    })
    .unwrap();

    let err = provider.fetch("10.0.0.1").await.unwrap_err();
    assert!(matches!(err, VaultError::TokenFile { .. }));
}

#[tokio::test]
async fn target_cannot_escape_the_mount() {
    // Given: a readable path outside the kv mount
    let addr = spawn_vault().await;
    let token = token_file(TOKEN);

    // When: the target tries to climb out of the mount
    let err = provider(addr, &token)
        .fetch("../sys/policy")
        .await
        .unwrap_err();

    // Then: the kv handler saw it as one unknown secret name
    assert!(matches!(err, VaultError::Status { status: 404, .. }));
}

#[tokio::test]
async fn unresponsive_vault_times_out() {
    // Given: a mount whose handler never answers and a 1s request limit
    let addr = spawn_vault().await;
    let token = token_file(TOKEN);
    let provider = VaultProvider::new(&VaultSettings {
        enabled: true,
        address: format!("http://{addr}"),
        token_file: token.path().display().to_string(),
        mount: "slow".to_owned(),
        request_timeout_secs: 1,
        ..VaultSettings::default()
    })
    .unwrap();

    // When
    let result = tokio::time::timeout(Duration::from_secs(10), provider.fetch("10.0.0.1")).await;

    // Then: the client gave up on its own
    let err = result.expect("request timeout must fire first").unwrap_err();
    assert!(matches!(err, VaultError::Request { .. }));
}
