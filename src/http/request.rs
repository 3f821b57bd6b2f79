//! Request handling helpers.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4) for `x-request-id`
//! - Extract the `x-token` header required by the API routes
//! - Decode JSON bodies with `{"detail": ...}` rejections
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Token presence is checked; its value is not verified

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::{request::Parts, HeaderName, HeaderValue, Request};
use axum::Json;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::response::ApiError;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_TOKEN: HeaderName = HeaderName::from_static("x-token");

/// Request ID generator producing UUID v4 values.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Value of the mandatory `x-token` header.
#[derive(Debug, Clone)]
pub struct XToken(pub String);

impl<S> FromRequestParts<S> for XToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(&X_TOKEN)
            .and_then(|v| v.to_str().ok())
            .map(|v| XToken(v.to_string()))
            .ok_or_else(|| ApiError::Validation("X-Token header missing".to_string()))
    }
}

/// JSON body extractor whose rejections use the API error shape.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: axum::extract::Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique_uuids() {
        let request = Request::new(());
        let mut maker = UuidRequestId;
        let a = maker.make_request_id(&request).unwrap();
        let b = maker.make_request_id(&request).unwrap();

        let a = a.header_value().to_str().unwrap().to_string();
        let b = b.header_value().to_str().unwrap().to_string();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[tokio::test]
    async fn test_x_token_extraction() {
        let (mut parts, _) = Request::builder()
            .header("x-token", "demo")
            .body(())
            .unwrap()
            .into_parts();
        let token = XToken::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(token.0, "demo");

        let (mut parts, _) = Request::new(()).into_parts();
        assert!(matches!(
            XToken::from_request_parts(&mut parts, &()).await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_json_rejection_uses_api_error() {
        use crate::http::schemas::UserCreate;

        let request = Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from(r#"{"username":"a"}"#))
            .unwrap();
        match ApiJson::<UserCreate>::from_request(request, &()).await {
            Err(ApiError::Validation(detail)) => assert!(detail.contains("email")),
            Err(other) => panic!("unexpected rejection: {other:?}"),
            Ok(_) => panic!("body without email was accepted"),
        }

        let request = Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from(r#"{"username":"a","email":"a@example.com"}"#))
            .unwrap();
        let ApiJson(user) = ApiJson::<UserCreate>::from_request(request, &()).await.unwrap();
        assert_eq!(user.username, "a");
    }
}
