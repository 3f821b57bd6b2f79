//! In-memory backend that records every call.
//!
//! Used by the test suites and as a stand-in backend when no exporter is
//! wanted. Failure injection makes every call return an error or panic.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::telemetry::backend::{
    ApmBackend, AttributeValue, Attributes, BackendError, BackendSettings, Transaction,
    TransactionHandle,
};

/// How every backend call behaves.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    None = 0,
    Error = 1,
    Panic = 2,
}

impl From<u8> for FailureMode {
    fn from(val: u8) -> Self {
        match val {
            1 => FailureMode::Error,
            2 => FailureMode::Panic,
            _ => FailureMode::None,
        }
    }
}

/// One observed backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Initialize { app_name: String, environment: String },
    StartTransaction { name: String },
    RecordMetric { name: String, value: f64 },
    RecordEvent { event_type: String, attributes: Attributes },
    NoticeError { message: String },
    AddAttribute { transaction: String, key: String, value: AttributeValue },
    Rename { transaction: String, name: String },
    Finish { transaction: String, status: u16 },
}

#[derive(Debug, Default)]
struct Shared {
    calls: Mutex<Vec<BackendCall>>,
    failure: AtomicU8,
    initialized: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Vec<BackendCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log `call`, then fail according to the current mode.
    fn observe(&self, call: BackendCall) -> Result<(), BackendError> {
        let description = format!("{:?}", call);
        self.lock().push(call);

        match FailureMode::from(self.failure.load(Ordering::SeqCst)) {
            FailureMode::None => Ok(()),
            FailureMode::Error => Err(BackendError::Call(format!("injected failure: {}", description))),
            FailureMode::Panic => panic!("injected panic: {}", description),
        }
    }
}

/// Recording backend. Clones share the same call log.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    shared: Arc<Shared>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure(mode: FailureMode) -> Self {
        let backend = Self::new();
        backend.set_failure(mode);
        backend
    }

    pub fn set_failure(&self, mode: FailureMode) {
        self.shared.failure.store(mode as u8, Ordering::SeqCst);
    }

    /// Pretend a launcher already started the agent.
    pub fn mark_initialized(&self) {
        self.shared.initialized.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.shared.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.shared.lock().len()
    }

    pub fn clear(&self) {
        self.shared.lock().clear();
    }

    /// Names of all recorded metrics, in call order.
    pub fn metric_names(&self) -> Vec<String> {
        self.shared
            .lock()
            .iter()
            .filter_map(|call| match call {
                BackendCall::RecordMetric { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ApmBackend for RecordingBackend {
    fn initialize(&self, settings: &BackendSettings) -> Result<(), BackendError> {
        self.shared.observe(BackendCall::Initialize {
            app_name: settings.app_name.clone(),
            environment: settings.environment.clone(),
        })?;
        self.shared.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.shared.initialized.load(Ordering::SeqCst)
    }

    fn start_transaction(&self, name: &str) -> Result<TransactionHandle, BackendError> {
        self.shared.observe(BackendCall::StartTransaction { name: name.to_string() })?;
        Ok(Arc::new(RecordingTransaction {
            shared: self.shared.clone(),
            name: Mutex::new(name.to_string()),
        }))
    }

    fn record_metric(&self, name: &str, value: f64) -> Result<(), BackendError> {
        self.shared.observe(BackendCall::RecordMetric { name: name.to_string(), value })
    }

    fn record_event(&self, event_type: &str, attributes: &Attributes) -> Result<(), BackendError> {
        self.shared.observe(BackendCall::RecordEvent {
            event_type: event_type.to_string(),
            attributes: attributes.clone(),
        })
    }

    fn notice_error(&self, error: &(dyn std::error::Error + 'static)) -> Result<(), BackendError> {
        self.shared.observe(BackendCall::NoticeError { message: error.to_string() })
    }
}

struct RecordingTransaction {
    shared: Arc<Shared>,
    name: Mutex<String>,
}

impl RecordingTransaction {
    fn current_name(&self) -> String {
        self.name.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Transaction for RecordingTransaction {
    fn add_attribute(&self, key: &str, value: AttributeValue) -> Result<(), BackendError> {
        self.shared.observe(BackendCall::AddAttribute {
            transaction: self.current_name(),
            key: key.to_string(),
            value,
        })
    }

    fn rename(&self, name: &str) -> Result<(), BackendError> {
        self.shared.observe(BackendCall::Rename {
            transaction: self.current_name(),
            name: name.to_string(),
        })?;
        *self.name.lock().unwrap_or_else(PoisonError::into_inner) = name.to_string();
        Ok(())
    }

    fn finish(&self, status: u16) -> Result<(), BackendError> {
        self.shared.observe(BackendCall::Finish {
            transaction: self.current_name(),
            status,
        })
    }
}
