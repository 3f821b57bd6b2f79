use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::http::request::XToken;
use crate::http::schemas::{unix_timestamp, HealthResponse, ServiceInfo};
use crate::http::server::AppState;
use crate::telemetry::RequestTelemetry;

pub const SERVICE_NAME: &str = "apm-demo";

/// Service banner with the APM status.
pub async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    let status = state.telemetry.state().status();

    Json(ServiceInfo {
        message: "APM Demo API".to_string(),
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: status.environment,
        apm_status: if status.enabled { "active" } else { "inactive" }.to_string(),
        apm_app_name: status.app_name,
        apm_license_configured: status.configured,
        apm_initialized_by: if status.already_initialized_externally {
            "entrypoint"
        } else {
            "application"
        }
        .to_string(),
    })
}

/// Liveness probe without instrumentation.
pub async fn liveness() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn health_check(
    _token: XToken,
    Extension(telemetry): Extension<RequestTelemetry>,
) -> Json<HealthResponse> {
    telemetry.record_metric("Custom/HealthCheck", 1.0);
    telemetry.add_attribute("endpoint", "health_check");
    telemetry.add_attribute("health_status", "healthy");

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: unix_timestamp(),
        service: SERVICE_NAME.to_string(),
    })
}
