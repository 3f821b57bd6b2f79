//! Route handlers.
//!
//! Handlers receive a [`RequestTelemetry`](crate::telemetry::RequestTelemetry)
//! from the telemetry middleware and call it unconditionally; whether
//! anything reaches the APM backend is decided by the facade.

pub mod data;
pub mod health;
pub mod slow_operation;
pub mod users;
