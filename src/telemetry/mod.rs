//! APM telemetry subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     TelemetryConfig
//!     → state.rs (validate credential, initialize backend once)
//!     → TelemetryState (immutable, enabled or disabled)
//!     → facade.rs (TelemetryFacade, shared via Arc)
//!
//! Per request:
//!     telemetry middleware
//!     → RequestTelemetry (facade + transaction handle)
//!     → handlers record metrics/events/attributes/errors
//!     → backend.rs trait (prometheus.rs or recording.rs)
//! ```
//!
//! # Design Decisions
//! - Disabled telemetry is a no-op, never an error
//! - Backend failures and panics are logged and swallowed at the facade
//! - Transactions are passed explicitly, never looked up ambiently

pub mod backend;
pub mod facade;
pub mod prometheus;
pub mod recording;
pub mod state;

pub use backend::{
    ApmBackend, AttributeValue, Attributes, BackendError, BackendSettings, Transaction,
    TransactionHandle,
};
pub use facade::{RequestTelemetry, TelemetryFacade};
pub use prometheus::PrometheusBackend;
pub use recording::{BackendCall, FailureMode, RecordingBackend};
pub use state::{validate_credential, TelemetryState, TelemetryStatus};
