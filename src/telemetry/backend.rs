//! APM backend capability.
//!
//! # Responsibilities
//! - Define the narrow interface the facade needs from an APM client
//! - Define the request-scoped transaction handle
//! - Provide the panic/error isolation boundary shared by all callers
//!
//! # Design Decisions
//! - Backends report failure through `BackendError`; panics are mapped to
//!   `BackendError::Panicked` by [`isolate`]
//! - Transactions are explicit `Arc` handles, never thread-local lookups

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Scalar value attached to events, errors and transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Str(s) => f.write_str(s),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Str(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Str(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<u64> for AttributeValue {
    fn from(v: u64) -> Self {
        AttributeValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<usize> for AttributeValue {
    fn from(v: usize) -> Self {
        AttributeValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

/// Ordered attribute map.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Build an [`Attributes`] map from `key => value` pairs.
#[macro_export]
macro_rules! attributes {
    () => { $crate::telemetry::Attributes::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::telemetry::Attributes::new();
        $( map.insert(($key).to_string(), $crate::telemetry::AttributeValue::from($value)); )+
        map
    }};
}

/// Errors raised by a backend client.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend initialization failed: {0}")]
    Initialization(String),

    #[error("backend is not initialized")]
    NotInitialized,

    #[error("transaction already finished")]
    TransactionFinished,

    #[error("backend call failed: {0}")]
    Call(String),

    #[error("backend panicked during {0}")]
    Panicked(&'static str),
}

/// Settings handed to the backend at initialization.
#[derive(Clone)]
pub struct BackendSettings {
    pub license_key: String,
    pub app_name: String,
    pub environment: String,
}

impl fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSettings")
            .field("license_key", &"<redacted>")
            .field("app_name", &self.app_name)
            .field("environment", &self.environment)
            .finish()
    }
}

/// A unit of work (usually one request) owned by the backend.
pub trait Transaction: Send + Sync {
    fn add_attribute(&self, key: &str, value: AttributeValue) -> Result<(), BackendError>;

    fn rename(&self, name: &str) -> Result<(), BackendError>;

    /// Close the transaction with the final response status.
    fn finish(&self, status: u16) -> Result<(), BackendError>;
}

/// Shared transaction handle.
pub type TransactionHandle = Arc<dyn Transaction>;

/// APM client capability consumed by the facade.
pub trait ApmBackend: Send + Sync {
    fn initialize(&self, settings: &BackendSettings) -> Result<(), BackendError>;

    /// Whether the backend is already running, e.g. started by a launcher.
    fn is_initialized(&self) -> bool {
        false
    }

    fn start_transaction(&self, name: &str) -> Result<TransactionHandle, BackendError>;

    fn record_metric(&self, name: &str, value: f64) -> Result<(), BackendError>;

    fn record_event(&self, event_type: &str, attributes: &Attributes) -> Result<(), BackendError>;

    fn notice_error(&self, error: &(dyn std::error::Error + 'static)) -> Result<(), BackendError>;
}

/// Run a backend call, converting a panic into `BackendError::Panicked`.
pub fn isolate<T, F>(operation: &'static str, call: F) -> Result<T, BackendError>
where
    F: FnOnce() -> Result<T, BackendError>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(_) => Err(BackendError::Panicked(operation)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_macro_converts_scalars() {
        let attrs = attributes! {
            "endpoint" => "create_user",
            "user_id" => 7i64,
            "ok" => true,
        };
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs["endpoint"], AttributeValue::Str("create_user".into()));
        assert_eq!(attrs["user_id"], AttributeValue::Int(7));
        assert_eq!(attrs["ok"].to_string(), "true");
    }

    #[test]
    fn test_isolate_maps_panic() {
        let result: Result<(), _> = isolate("record_metric", || panic!("boom"));
        assert!(matches!(result, Err(BackendError::Panicked("record_metric"))));
    }

    #[test]
    fn test_settings_debug_redacts_key() {
        let settings = BackendSettings {
            license_key: "abcdefghij1234567890".into(),
            app_name: "demo".into(),
            environment: "test".into(),
        };
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("abcdefghij"));
        assert!(rendered.contains("<redacted>"));
    }
}
