//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the demo API.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener and routing settings.
    pub server: ServerConfig,

    /// APM agent settings.
    pub telemetry: TelemetryConfig,

    /// Upstream data source for the data endpoint.
    pub external_api: ExternalApiConfig,

    /// Simulated slow operation.
    pub slow_operation: SlowOperationConfig,

    /// In-memory user store.
    pub users: UserStoreConfig,

    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Prefix for the versioned API routes.
    pub api_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            request_timeout_secs: 30,
            api_prefix: "/api/v1".to_string(),
        }
    }
}

/// APM agent configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// License key gating the agent. Absent means unconfigured.
    pub license_key: Option<String>,

    /// Application name reported to the backend.
    pub app_name: String,

    /// Deployment environment label.
    pub environment: String,

    /// The agent was already started by an external launcher.
    pub preinitialized: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            license_key: None,
            app_name: "APM Demo API".to_string(),
            environment: "development".to_string(),
            preinitialized: false,
            metrics_address: "0.0.0.0:9464".to_string(),
        }
    }
}

impl std::fmt::Debug for TelemetryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryConfig")
            .field("license_key", &self.license_key.as_ref().map(|_| "<redacted>"))
            .field("app_name", &self.app_name)
            .field("environment", &self.environment)
            .field("preinitialized", &self.preinitialized)
            .field("metrics_address", &self.metrics_address)
            .finish()
    }
}

/// External data source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExternalApiConfig {
    /// Full URL fetched by the data endpoint.
    pub url: String,

    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ExternalApiConfig {
    fn default() -> Self {
        Self {
            url: "https://jsonplaceholder.typicode.com/posts/1".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SlowOperationConfig {
    /// Simulated processing time in milliseconds.
    pub delay_ms: u64,
}

impl Default for SlowOperationConfig {
    fn default() -> Self {
        Self { delay_ms: 2000 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UserStoreConfig {
    /// Maximum number of stored users.
    pub max_users: usize,
}

impl Default for UserStoreConfig {
    fn default() -> Self {
        Self { max_users: 10_000 }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
