//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use apm_demo::config::{AppConfig, TelemetryConfig};
use apm_demo::lifecycle::{init_telemetry_with, Shutdown};
use apm_demo::telemetry::{RecordingBackend, TelemetryFacade, TelemetryState};
use apm_demo::HttpServer;

pub const VALID_KEY: &str = "abcdefghij1234567890";

/// Start a programmable mock upstream on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                // Drain the request head before answering.
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;

                let (status, body) = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    502 => "502 Bad Gateway",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
                tokio::time::sleep(Duration::from_millis(10)).await;
            });
        }
    });

    addr
}

/// Start a mock upstream that always answers with `body`.
pub async fn start_mock_backend(body: &'static str) -> SocketAddr {
    start_programmable_backend(move || async move { (200, body.to_string()) }).await
}

/// Configuration suitable for tests: fast slow-operation, given upstream.
pub fn test_config(upstream: SocketAddr) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.bind_address = "127.0.0.1:0".to_string();
    config.telemetry = TelemetryConfig {
        license_key: Some(VALID_KEY.to_string()),
        app_name: "APM Demo Tests".to_string(),
        environment: "test".to_string(),
        ..TelemetryConfig::default()
    };
    config.external_api.url = format!("http://{}/posts/1", upstream);
    config.external_api.timeout_secs = 2;
    config.slow_operation.delay_ms = 20;
    config
}

/// A running server plus the recording backend it reports to.
pub struct TestApp {
    pub addr: SocketAddr,
    pub backend: RecordingBackend,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).header("x-token", "test-token")
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).header("x-token", "test-token")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Spawn the server with telemetry initialized against a recording backend.
pub async fn spawn_app(config: AppConfig) -> TestApp {
    let backend = RecordingBackend::new();
    let telemetry = init_telemetry_with(&config.telemetry, Arc::new(backend.clone()));
    backend.clear();
    spawn_with(config, telemetry, backend).await
}

/// Spawn the server with telemetry forced off.
pub async fn spawn_disabled_app(config: AppConfig) -> TestApp {
    let backend = RecordingBackend::new();
    let state = TelemetryState::disabled(&config.telemetry);
    let telemetry = TelemetryFacade::new(state, Arc::new(backend.clone()));
    spawn_with(config, telemetry, backend).await
}

async fn spawn_with(config: AppConfig, telemetry: TelemetryFacade, backend: RecordingBackend) -> TestApp {
    apm_demo::observability::init_test_logging();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, telemetry).unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    TestApp {
        addr,
        backend,
        client,
        shutdown,
    }
}
