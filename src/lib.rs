//! APM-instrumented demo API library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod services;
pub mod telemetry;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use telemetry::{RequestTelemetry, TelemetryFacade, TelemetryState};
