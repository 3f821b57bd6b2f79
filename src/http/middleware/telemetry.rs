//! Per-request APM instrumentation.
//!
//! Opens a transaction for every request, hands handlers a
//! [`RequestTelemetry`] through request extensions, and records request
//! count, latency and status once the response is ready.
//!
//! Timeouts and handler panics are turned into responses below this layer,
//! so they are observed here as 408 and 500 like any other status.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::attributes;
use crate::http::response::HandlerPanic;
use crate::http::server::AppState;
use crate::telemetry::RequestTelemetry;

pub async fn telemetry_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let telemetry = RequestTelemetry::begin(&state.telemetry, &format!("{} {}", method, path));
    request.extensions_mut().insert(telemetry.clone());

    let response = next.run(request).await;

    let elapsed = start_time.elapsed();
    let status = response.status();

    telemetry.record_metric("Custom/RequestCount", 1.0);
    telemetry.record_metric("Custom/ResponseTime", elapsed.as_secs_f64());
    telemetry.add_attribute("response_status", status.as_u16().to_string());
    telemetry.add_attribute("request_path", path.as_str());
    telemetry.add_attribute("request_method", method.as_str());

    if let Some(panic) = response.extensions().get::<HandlerPanic>() {
        tracing::error!(method = %method, path = %path, error = %panic, "Handler panicked");
        telemetry.notice_error(
            panic,
            &attributes! {
                "request_path" => path.as_str(),
                "request_method" => method.as_str(),
                "processing_time" => elapsed.as_secs_f64(),
            },
        );
    }

    if status == StatusCode::REQUEST_TIMEOUT {
        tracing::warn!(method = %method, path = %path, elapsed_ms = elapsed.as_millis() as u64, "Request timed out");
    }

    if status.is_server_error() {
        tracing::error!(method = %method, path = %path, status = %status, "Request failed");
        telemetry.record_metric("Custom/RequestError", 1.0);
    }

    tracing::debug!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Request processed"
    );

    telemetry.finish(status.as_u16());
    response
}
