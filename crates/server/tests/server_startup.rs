use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// A valid config whose accounts service is unreachable, so the process
/// stays parked waiting for the OAuth callback.
fn minimal_config(port: u16) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[reddit]
username = "dissic-test"

[spotify]
client_id = "test-client"
client_secret = "test-secret"
accounts_base_url = "http://127.0.0.1:1"
api_base_url = "http://127.0.0.1:1/v1"

[[playlists]]
name = "Fresh Music"
subreddits = ["listentothis"]
"#,
        port
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn command(config_path: &Path) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_dissic"));
    cmd.env("DISSIC_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .env_remove("REDDIT_USERNAME")
        .env_remove("SPOTIFY_CLIENT_ID")
        .env_remove("SPOTIFY_CLIENT_SECRET")
        .kill_on_drop(true);
    cmd
}

/// Spawn the server and return a handle
fn spawn_server(config_path: &Path) -> tokio::process::Child {
    command(config_path).spawn().expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_health_endpoint_before_authentication() {
    let port = get_available_port();
    let config = write_config(&minimal_config(port));
    let mut server = spawn_server(config.path());

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["authenticated"], false);
    assert!(json["scanner"].is_null());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_config_endpoint_returns_sanitized() {
    let port = get_available_port();
    let config = write_config(&minimal_config(port));
    let mut server = spawn_server(config.path());

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/config", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body = response.text().await.expect("Failed to read body");
    assert!(!body.contains("test-secret"));

    let json: serde_json::Value = serde_json::from_str(&body).expect("Failed to parse JSON");
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["spotify"]["client_secret_configured"], true);
    assert_eq!(json["playlists"][0]["name"], "Fresh Music");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_callback_with_forged_state_is_rejected() {
    let port = get_available_port();
    let config = write_config(&minimal_config(port));
    let mut server = spawn_server(config.path());

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = client
        .get(format!(
            "http://127.0.0.1:{}/spotifyAuth?code=abc&state=forged",
            port
        ))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 400);

    // The handshake is still pending
    let json: serde_json::Value = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["authenticated"], false);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = timeout(
        Duration::from_secs(5),
        command(Path::new("/nonexistent/config.toml")).output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let port = get_available_port();
    let content = minimal_config(port).replace(
        "username = \"dissic-test\"",
        "username = \"dissic-test\"\nrequest_rate_secs = 1",
    );
    let config = write_config(&content);

    let result = timeout(Duration::from_secs(5), command(config.path()).output())
        .await
        .expect("Command timed out")
        .expect("Failed to execute command");

    assert!(!result.status.success());
}
