//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the APM backend and decide telemetry state exactly once
//! - Report the monitoring status before traffic is accepted
//!
//! # Design Decisions
//! - Telemetry problems never abort startup; they disable monitoring
//! - The resulting facade is injected, never stored in a global

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::TelemetryConfig;
use crate::telemetry::{ApmBackend, PrometheusBackend, TelemetryFacade, TelemetryState};

/// Initialize telemetry with the Prometheus backend.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryFacade {
    match config.metrics_address.parse::<SocketAddr>() {
        Ok(addr) => init_telemetry_with(config, Arc::new(PrometheusBackend::new(addr))),
        Err(e) => {
            tracing::error!(
                metrics_address = %config.metrics_address,
                error = %e,
                "Failed to parse metrics address; monitoring disabled"
            );
            let backend = Arc::new(PrometheusBackend::new(SocketAddr::from(([127, 0, 0, 1], 0))));
            TelemetryFacade::new(TelemetryState::disabled(config), backend)
        }
    }
}

/// Initialize telemetry against an arbitrary backend.
pub fn init_telemetry_with(config: &TelemetryConfig, backend: Arc<dyn ApmBackend>) -> TelemetryFacade {
    let state = TelemetryState::initialize(config, backend.as_ref());
    log_status(&state);
    TelemetryFacade::new(state, backend)
}

fn log_status(state: &TelemetryState) {
    let status = state.status();
    if status.enabled {
        let initialized_by = if status.already_initialized_externally {
            "entrypoint"
        } else {
            "application"
        };
        tracing::info!(
            app_name = %status.app_name,
            environment = %status.environment,
            initialized_by,
            "APM monitoring is ACTIVE"
        );
    } else {
        tracing::info!(
            license_configured = status.configured,
            "APM monitoring is INACTIVE"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::RecordingBackend;

    #[test]
    fn test_placeholder_key_starts_inactive() {
        let config = TelemetryConfig {
            license_key: Some("your_license_key_here".into()),
            ..TelemetryConfig::default()
        };
        let facade = init_telemetry_with(&config, Arc::new(RecordingBackend::new()));
        assert!(!facade.state().status().configured);
        assert!(!facade.is_enabled());
    }

    #[test]
    fn test_valid_key_starts_active() {
        let config = TelemetryConfig {
            license_key: Some("abcdefghij1234567890".into()),
            ..TelemetryConfig::default()
        };
        let facade = init_telemetry_with(&config, Arc::new(RecordingBackend::new()));
        assert!(facade.state().status().configured);
        assert!(facade.is_enabled());
    }

    #[test]
    fn test_bad_metrics_address_disables() {
        let config = TelemetryConfig {
            license_key: Some("abcdefghij1234567890".into()),
            metrics_address: "nowhere".into(),
            ..TelemetryConfig::default()
        };
        assert!(!init_telemetry(&config).is_enabled());
    }
}
