use axum::{extract::State, Extension, Json};

use crate::attributes;
use crate::http::request::XToken;
use crate::http::response::ApiError;
use crate::http::schemas::{unix_timestamp, DataResponse, Metadata};
use crate::http::server::AppState;
use crate::services::data_source;
use crate::telemetry::RequestTelemetry;

/// Fetch the upstream document and return it processed.
pub async fn get_data(
    _token: XToken,
    State(state): State<AppState>,
    Extension(telemetry): Extension<RequestTelemetry>,
) -> Result<Json<DataResponse>, ApiError> {
    telemetry.set_transaction_name("DataProcessing");
    telemetry.add_attribute("endpoint", "get_data");
    telemetry.add_attribute("source", "external_api");
    telemetry.record_metric("Custom/DataRequest", 1.0);

    let raw = match state.data_source.fetch().await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!(error = %e, endpoint = %state.data_source.endpoint(), "Error in get_data");
            telemetry.notice_error(
                &e,
                &attributes! {
                    "endpoint" => "get_data",
                    "operation" => "external_api_call",
                    "error_type" => "data_processing_error",
                },
            );
            telemetry.record_metric("Custom/DataError", 1.0);
            telemetry.add_attribute("data_processed", "false");
            return Err(ApiError::Internal("Internal server error"));
        }
    };

    let processed = data_source::process(raw);

    telemetry.record_metric("Custom/DataSuccess", 1.0);
    telemetry.add_attribute("data_processed", "true");
    telemetry.add_attribute("data_source", state.data_source.endpoint().host_str().unwrap_or("unknown"));
    tracing::info!("Data processed successfully");

    Ok(Json(DataResponse {
        success: true,
        data: Some(processed),
        metadata: Some(Metadata {
            processed_at: unix_timestamp(),
            source: "external_api".to_string(),
        }),
    }))
}
