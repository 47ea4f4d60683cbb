#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::{Body, Bytes},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use backoffice_mock_api::{app::app, config::AppConfig, database::JsonStore};

pub const PREFIX: &str = "/backoffice/api/v1";

pub fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/db.json")
}

/// Development defaults with pinned routes, independent of the caller's env
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.routes.alias_prefix = PREFIX.to_string();
    config.routes.resource = "users".to_string();
    config.routes.health_path = "/health".to_string();
    config.pagination.default_page_size = 10;
    config.api.enable_request_logging = false;
    config
}

/// Full application over a fresh copy of the fixture document
pub fn router() -> Router {
    let store = JsonStore::load(&fixture_path()).expect("fixture db.json loads");
    app(Arc::new(store), &test_config())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({}): {:?}", e, self.body))
    }
}

pub async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&value).expect("serializable body"))
        }
        None => Body::empty(),
    };
    let request = builder.body(body).expect("valid request");

    let response = router.oneshot(request).await.expect("infallible router");
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");

    TestResponse { status, content_type, body }
}

pub async fn get(router: Router, uri: &str) -> TestResponse {
    send(router, Method::GET, uri, None).await
}

pub fn ids(data: &Value) -> Vec<String> {
    data.as_array()
        .expect("data is an array")
        .iter()
        .map(|record| match &record["id"] {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}

// Spawned-binary harness for end-to-end smoke tests

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_backoffice-mock-api"));
        cmd.env("APP_ENV", "development")
            .env("SECURITY_ENABLE_CORS", "true")
            .env("SECURITY_CORS_ORIGINS", "http://localhost:5173")
            .env("PORT", port.to_string())
            .env("HOST", "127.0.0.1")
            .env("DB_PATH", fixture_path())
            .env("API_ALIAS_PREFIX", PREFIX)
            .env("API_RESOURCE", "users")
            .env("API_HEALTH_PATH", "/health")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Spawn the built binary on a free port and wait until /health answers
pub async fn start_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
