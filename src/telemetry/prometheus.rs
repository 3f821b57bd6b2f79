//! Prometheus-backed APM backend.
//!
//! # Metrics
//! - `apm_custom_metric` (histogram): custom metric values, labeled by `name`
//! - `apm_custom_events_total` (counter): custom events by `event_type`
//! - `apm_errors_total` (counter): reported errors
//! - `apm_transaction_duration_seconds` (histogram): by `transaction`, `status`
//! - `apm_transactions_total` (counter): by `transaction`, `status`
//!
//! Every series carries the global labels `app` and `environment`.
//! Events, errors and finished transactions are also emitted as structured
//! log lines under the `apm` target.

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::telemetry::backend::{
    ApmBackend, AttributeValue, Attributes, BackendError, BackendSettings, Transaction,
    TransactionHandle,
};

const LATENCY_BUCKETS: [f64; 12] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Backend exporting through a Prometheus scrape endpoint.
#[derive(Debug)]
pub struct PrometheusBackend {
    listen_address: SocketAddr,
    initialized: AtomicBool,
}

impl PrometheusBackend {
    pub fn new(listen_address: SocketAddr) -> Self {
        Self {
            listen_address,
            initialized: AtomicBool::new(false),
        }
    }
}

impl ApmBackend for PrometheusBackend {
    fn initialize(&self, settings: &BackendSettings) -> Result<(), BackendError> {
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }

        // The exporter has no account concept; the key only gates activation.
        PrometheusBuilder::new()
            .with_http_listener(self.listen_address)
            .add_global_label("app", settings.app_name.clone())
            .add_global_label("environment", settings.environment.clone())
            .set_buckets_for_metric(
                Matcher::Full("apm_transaction_duration_seconds".to_string()),
                &LATENCY_BUCKETS,
            )
            .map_err(|e| BackendError::Initialization(e.to_string()))?
            .install()
            .map_err(|e| BackendError::Initialization(e.to_string()))?;

        self.initialized.store(true, Ordering::SeqCst);
        tracing::info!(address = %self.listen_address, "Prometheus exporter listening");
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn start_transaction(&self, name: &str) -> Result<TransactionHandle, BackendError> {
        Ok(Arc::new(PrometheusTransaction::new(name)))
    }

    fn record_metric(&self, name: &str, value: f64) -> Result<(), BackendError> {
        metrics::histogram!("apm_custom_metric", "name" => name.to_string()).record(value);
        Ok(())
    }

    fn record_event(&self, event_type: &str, attributes: &Attributes) -> Result<(), BackendError> {
        metrics::counter!("apm_custom_events_total", "event_type" => event_type.to_string()).increment(1);
        tracing::info!(
            target: "apm",
            event_type,
            attributes = %render_attributes(attributes),
            "Custom event"
        );
        Ok(())
    }

    fn notice_error(&self, error: &(dyn std::error::Error + 'static)) -> Result<(), BackendError> {
        metrics::counter!("apm_errors_total").increment(1);
        let source = error.source().map(|s| s.to_string()).unwrap_or_default();
        tracing::error!(target: "apm", error = %error, source = %source, "Error noticed");
        Ok(())
    }
}

fn render_attributes(attributes: &Attributes) -> String {
    serde_json::to_string(attributes).unwrap_or_else(|_| "{}".to_string())
}

/// Transaction timed from creation until `finish`.
pub struct PrometheusTransaction {
    name: Mutex<String>,
    attributes: Mutex<Attributes>,
    started: Instant,
    finished: AtomicBool,
}

impl PrometheusTransaction {
    fn new(name: &str) -> Self {
        Self {
            name: Mutex::new(name.to_string()),
            attributes: Mutex::new(Attributes::new()),
            started: Instant::now(),
            finished: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), BackendError> {
        if self.finished.load(Ordering::SeqCst) {
            return Err(BackendError::TransactionFinished);
        }
        Ok(())
    }
}

impl Transaction for PrometheusTransaction {
    fn add_attribute(&self, key: &str, value: AttributeValue) -> Result<(), BackendError> {
        self.ensure_open()?;
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }

    fn rename(&self, name: &str) -> Result<(), BackendError> {
        self.ensure_open()?;
        *self.name.lock().unwrap_or_else(PoisonError::into_inner) = name.to_string();
        Ok(())
    }

    fn finish(&self, status: u16) -> Result<(), BackendError> {
        if self.finished.swap(true, Ordering::SeqCst) {
            return Err(BackendError::TransactionFinished);
        }

        let elapsed = self.started.elapsed();
        let name = self.name.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let attributes = self.attributes.lock().unwrap_or_else(PoisonError::into_inner);

        metrics::histogram!(
            "apm_transaction_duration_seconds",
            "transaction" => name.clone(),
            "status" => status.to_string()
        )
        .record(elapsed.as_secs_f64());
        metrics::counter!(
            "apm_transactions_total",
            "transaction" => name.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        tracing::info!(
            target: "apm",
            transaction = %name,
            status,
            duration_ms = elapsed.as_millis() as u64,
            attributes = %render_attributes(&attributes),
            "Transaction finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> PrometheusBackend {
        PrometheusBackend::new("127.0.0.1:0".parse().unwrap())
    }

    #[test]
    fn test_custom_metrics_reach_recorder() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let backend = backend();

        metrics::with_local_recorder(&recorder, || {
            backend.record_metric("Custom/RequestCount", 1.0).unwrap();
            backend
                .record_event("UserCreated", &crate::attributes! { "username" => "alice" })
                .unwrap();
        });

        let rendered = handle.render();
        assert!(rendered.contains("apm_custom_metric"));
        assert!(rendered.contains("Custom/RequestCount"));
        assert!(rendered.contains("apm_custom_events_total"));
        assert!(rendered.contains("event_type=\"UserCreated\""));
    }

    #[test]
    fn test_transaction_uses_final_name() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let backend = backend();

        metrics::with_local_recorder(&recorder, || {
            let txn = backend.start_transaction("GET /api/v1/data").unwrap();
            txn.rename("DataProcessing").unwrap();
            txn.add_attribute("endpoint", "get_data".into()).unwrap();
            txn.finish(200).unwrap();
        });

        let rendered = handle.render();
        assert!(rendered.contains("apm_transactions_total"));
        assert!(rendered.contains("transaction=\"DataProcessing\""));
        assert!(rendered.contains("status=\"200\""));
        assert!(!rendered.contains("GET /api/v1/data"));
    }

    #[test]
    fn test_finished_transaction_rejects_updates() {
        let txn = backend().start_transaction("GET /health").unwrap();
        txn.finish(200).unwrap();

        assert!(matches!(txn.finish(200), Err(BackendError::TransactionFinished)));
        assert!(matches!(txn.rename("late"), Err(BackendError::TransactionFinished)));
        assert!(matches!(
            txn.add_attribute("k", "v".into()),
            Err(BackendError::TransactionFinished)
        ));
    }

    #[test]
    fn test_not_initialized_until_installed() {
        assert!(!backend().is_initialized());
    }
}
