//! Request and response bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::User;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: f64,
    pub service: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Metadata {
    pub processed_at: f64,
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
}

impl UserCreate {
    /// Minimal shape check: non-empty username, `local@domain.tld` email.
    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("username must not be empty".to_string());
        }
        let valid_email = match self.email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !domain.contains('@')
            }
            None => false,
        };
        if !valid_email {
            return Err(format!("'{}' is not a valid email address", self.email));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct UserOperationResponse {
    pub success: bool,
    pub user: User,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SlowOperationResponse {
    pub success: bool,
    pub message: String,
    pub processing_time: f64,
}

/// Banner served at `/`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    pub status: String,
    pub version: String,
    pub environment: String,
    pub apm_status: String,
    pub apm_app_name: String,
    pub apm_license_configured: bool,
    pub apm_initialized_by: String,
}

/// Current time as fractional Unix seconds.
pub fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str, email: &str) -> UserCreate {
        UserCreate {
            username: username.into(),
            email: email.into(),
        }
    }

    #[test]
    fn test_user_validation() {
        assert!(user("alice", "alice@example.com").validate().is_ok());
        assert!(user("", "alice@example.com").validate().is_err());
        assert!(user("alice", "alice").validate().is_err());
        assert!(user("alice", "@example.com").validate().is_err());
        assert!(user("alice", "alice@localhost").validate().is_err());
        assert!(user("alice", "alice@a@b.com").validate().is_err());
    }
}
