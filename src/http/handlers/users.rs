use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::attributes;
use crate::http::request::{ApiJson, XToken};
use crate::http::response::ApiError;
use crate::http::schemas::{UserCreate, UserOperationResponse};
use crate::http::server::AppState;
use crate::services::{User, UserStoreError};
use crate::telemetry::RequestTelemetry;

pub async fn create_user(
    _token: XToken,
    State(state): State<AppState>,
    Extension(telemetry): Extension<RequestTelemetry>,
    ApiJson(payload): ApiJson<UserCreate>,
) -> Result<(StatusCode, Json<UserOperationResponse>), ApiError> {
    telemetry.set_transaction_name("UserCreation");
    telemetry.add_attribute("endpoint", "create_user");
    telemetry.add_attribute("username", payload.username.as_str());

    if let Err(reason) = payload.validate() {
        telemetry.add_attribute("creation_status", "failed_validation");
        return Err(ApiError::Validation(reason));
    }

    match state.users.create(&payload.username, &payload.email).await {
        Ok(user) => {
            telemetry.record_event(
                "UserCreated",
                &attributes! {
                    "username" => user.username.as_str(),
                    "email" => user.email.as_str(),
                    "user_id" => user.id,
                },
            );
            telemetry.record_metric("Custom/UserCreated", 1.0);
            telemetry.add_attribute("user_id", user.id.to_string());
            telemetry.add_attribute("creation_status", "success");

            tracing::info!(username = %user.username, user_id = user.id, "User created");

            Ok((
                StatusCode::CREATED,
                Json(UserOperationResponse {
                    success: true,
                    user,
                    message: "User created successfully".to_string(),
                }),
            ))
        }
        Err(UserStoreError::Duplicate) => {
            tracing::warn!(username = %payload.username, "User creation failed: duplicate");
            telemetry.record_metric("Custom/UserCreationFailed", 1.0);
            telemetry.add_attribute("creation_status", "failed_duplicate");
            Err(ApiError::BadRequest(UserStoreError::Duplicate.to_string()))
        }
        Err(e) => {
            tracing::error!(error = %e, username = %payload.username, "Error creating user");
            telemetry.notice_error(
                &e,
                &attributes! {
                    "endpoint" => "create_user",
                    "operation" => "user_creation",
                    "username" => payload.username.as_str(),
                    "error_type" => "database_error",
                },
            );
            telemetry.record_metric("Custom/UserCreationError", 1.0);
            telemetry.add_attribute("creation_status", "failed_error");
            Err(ApiError::Internal("Failed to create user"))
        }
    }
}

pub async fn list_users(
    _token: XToken,
    State(state): State<AppState>,
    Extension(telemetry): Extension<RequestTelemetry>,
) -> Json<Vec<User>> {
    telemetry.add_attribute("endpoint", "get_users");

    let users = state.users.list().await;
    let user_count = users.len();

    telemetry.record_metric("Custom/UsersListed", user_count as f64);
    telemetry.add_attribute("user_count", user_count.to_string());
    tracing::info!(user_count, "Retrieved users");

    Json(users)
}
