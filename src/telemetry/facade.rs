//! Fail-soft instrumentation facade.
//!
//! Every operation is a no-op while telemetry is disabled. While enabled,
//! backend calls run inside [`isolate`] and any error or panic is logged and
//! dropped, so instrumentation can never change a handler's outcome.

use std::sync::Arc;

use crate::telemetry::backend::{
    isolate, ApmBackend, AttributeValue, Attributes, BackendError, Transaction, TransactionHandle,
};
use crate::telemetry::state::TelemetryState;

/// Shared entry point for instrumentation calls.
#[derive(Clone)]
pub struct TelemetryFacade {
    state: Arc<TelemetryState>,
    backend: Arc<dyn ApmBackend>,
}

impl TelemetryFacade {
    pub fn new(state: TelemetryState, backend: Arc<dyn ApmBackend>) -> Self {
        Self {
            state: Arc::new(state),
            backend,
        }
    }

    pub fn state(&self) -> &TelemetryState {
        &self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    /// Run `call` only when enabled, swallowing any failure.
    fn guarded<T, F>(&self, operation: &'static str, call: F) -> Option<T>
    where
        F: FnOnce(&dyn ApmBackend) -> Result<T, BackendError>,
    {
        if !self.state.is_enabled() {
            return None;
        }

        match isolate(operation, || call(self.backend.as_ref())) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(operation, error = %e, "Telemetry call failed");
                None
            }
        }
    }

    pub fn record_metric(&self, name: &str, value: f64) {
        if self
            .guarded("record_metric", |backend| backend.record_metric(name, value))
            .is_some()
        {
            tracing::debug!(metric = name, value, "Metric recorded");
        }
    }

    pub fn record_event(&self, event_type: &str, attributes: &Attributes) {
        if self
            .guarded("record_event", |backend| backend.record_event(event_type, attributes))
            .is_some()
        {
            tracing::debug!(event_type, "Event recorded");
        }
    }

    /// Report an error, attaching `attributes` to the transaction when one exists.
    pub fn notice_error(
        &self,
        transaction: Option<&dyn Transaction>,
        error: &(dyn std::error::Error + 'static),
        attributes: &Attributes,
    ) {
        self.guarded("notice_error", |backend| {
            if let Some(txn) = transaction {
                for (key, value) in attributes {
                    // A lost attribute must not cost us the error report.
                    if let Err(e) = isolate("add_attribute", || txn.add_attribute(key, value.clone())) {
                        tracing::debug!(key = %key, error = %e, "Failed to attach error attribute");
                    }
                }
            }
            backend.notice_error(error)
        });
    }

    pub fn add_attribute(
        &self,
        transaction: Option<&dyn Transaction>,
        key: &str,
        value: impl Into<AttributeValue>,
    ) {
        let value = value.into();
        self.guarded("add_attribute", |_| match transaction {
            Some(txn) => txn.add_attribute(key, value),
            None => {
                tracing::debug!(key, "No active transaction for attribute");
                Ok(())
            }
        });
    }

    pub fn set_transaction_name(&self, transaction: Option<&dyn Transaction>, name: &str) {
        self.guarded("set_transaction_name", |_| match transaction {
            Some(txn) => txn.rename(name),
            None => {
                tracing::debug!(name, "No active transaction to rename");
                Ok(())
            }
        });
    }

    /// Open a transaction, or `None` when disabled or the backend refuses.
    pub fn begin_transaction(&self, name: &str) -> Option<TransactionHandle> {
        self.guarded("begin_transaction", |backend| backend.start_transaction(name))
    }

    pub fn end_transaction(&self, transaction: Option<&dyn Transaction>, status: u16) {
        if let Some(txn) = transaction {
            self.guarded("end_transaction", |_| txn.finish(status));
        }
    }
}

/// Facade bound to the transaction of one in-flight request.
///
/// Inserted into request extensions by the telemetry middleware.
#[derive(Clone)]
pub struct RequestTelemetry {
    facade: TelemetryFacade,
    transaction: Option<TransactionHandle>,
}

impl RequestTelemetry {
    pub fn new(facade: TelemetryFacade, transaction: Option<TransactionHandle>) -> Self {
        Self { facade, transaction }
    }

    /// Open a transaction named `name` through `facade`.
    pub fn begin(facade: &TelemetryFacade, name: &str) -> Self {
        let transaction = facade.begin_transaction(name);
        Self::new(facade.clone(), transaction)
    }

    pub fn has_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    fn transaction(&self) -> Option<&dyn Transaction> {
        self.transaction.as_deref()
    }

    pub fn record_metric(&self, name: &str, value: f64) {
        self.facade.record_metric(name, value);
    }

    pub fn record_event(&self, event_type: &str, attributes: &Attributes) {
        self.facade.record_event(event_type, attributes);
    }

    pub fn notice_error(&self, error: &(dyn std::error::Error + 'static), attributes: &Attributes) {
        self.facade.notice_error(self.transaction(), error, attributes);
    }

    pub fn add_attribute(&self, key: &str, value: impl Into<AttributeValue>) {
        self.facade.add_attribute(self.transaction(), key, value);
    }

    pub fn set_transaction_name(&self, name: &str) {
        self.facade.set_transaction_name(self.transaction(), name);
    }

    pub fn finish(&self, status: u16) {
        self.facade.end_transaction(self.transaction(), status);
    }
}
