//! Telemetry enablement state.
//!
//! # States
//! - Disabled: every facade call is a no-op
//! - Enabled: facade calls are forwarded to the backend
//!
//! # State Transitions
//! ```text
//! Uninitialized → Disabled: credential invalid, or backend init failed
//! Uninitialized → Enabled:  credential valid and backend running
//! ```
//!
//! The chosen state is terminal for the process lifetime.

use serde::Serialize;

use crate::config::TelemetryConfig;
use crate::telemetry::backend::{isolate, ApmBackend, BackendSettings};

/// Value shipped in sample configuration files.
pub const PLACEHOLDER_LICENSE_KEY: &str = "your_license_key_here";

/// Shortest credential accepted as configured.
pub const MIN_LICENSE_KEY_LEN: usize = 10;

/// Check whether a candidate credential looks like a real license key.
pub fn validate_credential(candidate: Option<&str>) -> bool {
    match candidate {
        None => false,
        Some(key) if key == PLACEHOLDER_LICENSE_KEY => false,
        Some(key) => key.chars().count() >= MIN_LICENSE_KEY_LEN,
    }
}

/// Mask a credential as `first8...last8`, or "Not configured".
pub fn license_preview(candidate: Option<&str>) -> String {
    match candidate {
        Some(key) if validate_credential(Some(key)) => {
            let head: String = key.chars().take(8).collect();
            let tail: String = {
                let mut rev: Vec<char> = key.chars().rev().take(8).collect();
                rev.reverse();
                rev.into_iter().collect()
            };
            format!("{}...{}", head, tail)
        }
        _ => "Not configured".to_string(),
    }
}

/// Diagnostic snapshot of the telemetry state.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TelemetryStatus {
    pub configured: bool,
    pub enabled: bool,
    pub app_name: String,
    pub environment: String,
    pub already_initialized_externally: bool,
    pub license_preview: String,
}

/// Process-wide telemetry decision, built once at startup.
#[derive(Clone)]
pub struct TelemetryState {
    enabled: bool,
    credential: Option<String>,
    app_name: String,
    environment: String,
    initialized_externally: bool,
}

impl TelemetryState {
    /// Decide whether monitoring is enabled, initializing the backend if needed.
    ///
    /// Never fails: invalid credentials and backend errors resolve to a
    /// disabled state.
    pub fn initialize(config: &TelemetryConfig, backend: &dyn ApmBackend) -> Self {
        let mut state = Self::disabled(config);

        if !validate_credential(config.license_key.as_deref()) {
            tracing::warn!(
                app_name = %config.app_name,
                "APM license key not configured or invalid; running without monitoring"
            );
            return state;
        }

        state.initialized_externally |=
            isolate("is_initialized", || Ok(backend.is_initialized())).unwrap_or(false);

        if state.initialized_externally {
            tracing::info!(app_name = %config.app_name, "APM agent already initialized by entrypoint");
            state.enabled = true;
            return state;
        }

        let settings = BackendSettings {
            license_key: config.license_key.clone().unwrap_or_default(),
            app_name: config.app_name.clone(),
            environment: config.environment.clone(),
        };

        match isolate("initialize", || backend.initialize(&settings)) {
            Ok(()) => {
                tracing::info!(
                    app_name = %config.app_name,
                    environment = %config.environment,
                    "APM agent initialized"
                );
                state.enabled = true;
            }
            Err(e) => {
                tracing::error!(error = %e, "APM agent initialization failed; running without monitoring");
            }
        }

        state
    }

    /// A state that never forwards anything to a backend.
    pub fn disabled(config: &TelemetryConfig) -> Self {
        Self {
            enabled: false,
            credential: config.license_key.clone(),
            app_name: config.app_name.clone(),
            environment: config.environment.clone(),
            initialized_externally: config.preinitialized,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn status(&self) -> TelemetryStatus {
        TelemetryStatus {
            configured: validate_credential(self.credential.as_deref()),
            enabled: self.enabled,
            app_name: self.app_name.clone(),
            environment: self.environment.clone(),
            already_initialized_externally: self.initialized_externally,
            license_preview: license_preview(self.credential.as_deref()),
        }
    }
}

impl std::fmt::Debug for TelemetryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryState")
            .field("enabled", &self.enabled)
            .field("license", &license_preview(self.credential.as_deref()))
            .field("app_name", &self.app_name)
            .field("environment", &self.environment)
            .field("initialized_externally", &self.initialized_externally)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::recording::{BackendCall, FailureMode, RecordingBackend};

    fn config_with(key: Option<&str>) -> TelemetryConfig {
        TelemetryConfig {
            license_key: key.map(String::from),
            ..TelemetryConfig::default()
        }
    }

    #[test]
    fn test_validate_rejects_absent_placeholder_and_short() {
        assert!(!validate_credential(None));
        assert!(!validate_credential(Some(PLACEHOLDER_LICENSE_KEY)));
        assert!(!validate_credential(Some("")));
        assert!(!validate_credential(Some("123456789")));
        assert!(validate_credential(Some("1234567890")));
    }

    #[test]
    fn test_invalid_credential_skips_backend() {
        for key in [None, Some(PLACEHOLDER_LICENSE_KEY), Some("short")] {
            let backend = RecordingBackend::new();
            let state = TelemetryState::initialize(&config_with(key), &backend);

            assert!(!state.is_enabled());
            assert!(!state.status().configured);
            assert_eq!(backend.call_count(), 0, "backend contacted for {:?}", key);
        }
    }

    #[test]
    fn test_valid_credential_enables() {
        let backend = RecordingBackend::new();
        let state = TelemetryState::initialize(&config_with(Some("abcdefghij1234567890")), &backend);

        assert!(state.is_enabled());
        let status = state.status();
        assert!(status.configured);
        assert!(status.enabled);
        assert!(!status.already_initialized_externally);
        assert_eq!(status.license_preview, "abcdefgh...34567890");
        assert!(matches!(backend.calls()[0], BackendCall::Initialize { .. }));
    }

    #[test]
    fn test_backend_failure_disables() {
        for mode in [FailureMode::Error, FailureMode::Panic] {
            let backend = RecordingBackend::with_failure(mode);
            let state = TelemetryState::initialize(&config_with(Some("abcdefghij1234567890")), &backend);

            assert!(!state.is_enabled());
            // The key itself is still well-formed.
            assert!(state.status().configured);
        }
    }

    #[test]
    fn test_preinitialized_skips_backend_init() {
        let backend = RecordingBackend::new();
        let config = TelemetryConfig {
            preinitialized: true,
            ..config_with(Some("abcdefghij1234567890"))
        };
        let state = TelemetryState::initialize(&config, &backend);

        assert!(state.is_enabled());
        assert!(state.status().already_initialized_externally);
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_running_backend_is_not_reinitialized() {
        let backend = RecordingBackend::new();
        backend.mark_initialized();
        let state = TelemetryState::initialize(&config_with(Some("abcdefghij1234567890")), &backend);

        assert!(state.is_enabled());
        assert!(state.status().already_initialized_externally);
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_preinitialized_never_overrides_invalid_key() {
        let backend = RecordingBackend::new();
        let config = TelemetryConfig {
            preinitialized: true,
            ..config_with(Some(PLACEHOLDER_LICENSE_KEY))
        };
        let state = TelemetryState::initialize(&config, &backend);

        assert!(!state.is_enabled());
    }

    #[test]
    fn test_license_preview() {
        assert_eq!(license_preview(None), "Not configured");
        assert_eq!(license_preview(Some("short")), "Not configured");
        assert_eq!(license_preview(Some("0123456789")), "01234567...23456789");
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let state = TelemetryState::disabled(&config_with(Some("abcdefghij1234567890XYZ")));
        let rendered = format!("{:?}", state);
        assert!(!rendered.contains("abcdefghij1234567890XYZ"));
    }
}
