//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs parse
//! - Validate value ranges (timeouts > 0, slow work within the request timeout)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - A missing license key is NOT an error; it disables telemetry

use std::net::SocketAddr;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("external_api.url: invalid URL '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("server.api_prefix: must start with '/' (got '{0}')")]
    InvalidPrefix(String),

    #[error("slow_operation.delay_ms ({delay_ms}) must be below the request timeout ({timeout_secs}s)")]
    DelayExceedsTimeout { delay_ms: u64, timeout_secs: u64 },

    #[error("external_api.timeout_secs ({upstream_secs}s) must be below the request timeout ({timeout_secs}s)")]
    UpstreamTimeoutExceedsRequest { upstream_secs: u64, timeout_secs: u64 },
}

/// Validate a loaded configuration, collecting every problem.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "server.bind_address", &config.server.bind_address);
    check_address(&mut errors, "telemetry.metrics_address", &config.telemetry.metrics_address);

    match url::Url::parse(&config.external_api.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl {
            value: config.external_api.url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            value: config.external_api.url.clone(),
            reason: e.to_string(),
        }),
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "server.request_timeout_secs" });
    }
    if config.external_api.timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "external_api.timeout_secs" });
    }
    if config.users.max_users == 0 {
        errors.push(ValidationError::Zero { field: "users.max_users" });
    }

    if !config.server.api_prefix.starts_with('/') {
        errors.push(ValidationError::InvalidPrefix(config.server.api_prefix.clone()));
    }

    if config.server.request_timeout_secs > 0
        && config.slow_operation.delay_ms >= config.server.request_timeout_secs * 1000
    {
        errors.push(ValidationError::DelayExceedsTimeout {
            delay_ms: config.slow_operation.delay_ms,
            timeout_secs: config.server.request_timeout_secs,
        });
    }

    if config.server.request_timeout_secs > 0
        && config.external_api.timeout_secs >= config.server.request_timeout_secs
    {
        errors.push(ValidationError::UpstreamTimeoutExceedsRequest {
            upstream_secs: config.external_api.timeout_secs,
            timeout_secs: config.server.request_timeout_secs,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
