use axum::{extract::State, Extension, Json};
use std::time::{Duration, Instant};

use crate::http::request::XToken;
use crate::http::schemas::SlowOperationResponse;
use crate::http::server::AppState;
use crate::telemetry::RequestTelemetry;

/// Simulate heavy processing so latency shows up in monitoring.
pub async fn slow_operation(
    _token: XToken,
    State(state): State<AppState>,
    Extension(telemetry): Extension<RequestTelemetry>,
) -> Json<SlowOperationResponse> {
    telemetry.set_transaction_name("SlowOperation");
    telemetry.add_attribute("endpoint", "slow_operation");
    telemetry.add_attribute("operation_type", "simulated_processing");

    let start = Instant::now();
    tokio::time::sleep(Duration::from_millis(state.config.slow_operation.delay_ms)).await;
    let processing_time = start.elapsed().as_secs_f64();

    telemetry.record_metric("Custom/SlowOperationTime", processing_time);
    telemetry.record_metric("Custom/SlowOperationCount", 1.0);
    telemetry.add_attribute("processing_time_seconds", format!("{:.3}", processing_time));
    tracing::info!(processing_time, "Slow operation completed");

    Json(SlowOperationResponse {
        success: true,
        message: "Slow operation completed".to_string(),
        processing_time,
    })
}
