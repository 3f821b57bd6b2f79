//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse and validate a TOML document without consulting the environment.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides using `lookup` (usually `std::env::var`).
///
/// Empty values are ignored so `APM_LICENSE_KEY=` does not clobber a file value.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("APP_BIND_ADDRESS") {
        config.server.bind_address = v;
    }
    if let Some(v) = get("APM_LICENSE_KEY") {
        config.telemetry.license_key = Some(v);
    }
    if let Some(v) = get("APM_APP_NAME") {
        config.telemetry.app_name = v;
    }
    if let Some(v) = get("APP_ENV") {
        config.telemetry.environment = v;
    }
    if let Some(v) = get("APM_PREINITIALIZED") {
        config.telemetry.preinitialized = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }
    if let Some(v) = get("APM_METRICS_ADDRESS") {
        config.telemetry.metrics_address = v;
    }
    if let Some(v) = get("EXTERNAL_API_URL") {
        config.external_api.url = v;
    }
    if let Some(v) = get("LOG_LEVEL") {
        config.logging.level = v;
    }
}
