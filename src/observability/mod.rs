//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → telemetry facade (APM metrics, events, transactions)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON lines)
//!     → Prometheus scrape endpoint (telemetry::prometheus)
//! ```

pub mod logging;

pub use logging::{init_logging, init_test_logging};
