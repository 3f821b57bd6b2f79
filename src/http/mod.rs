//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, x-token extraction)
//!     → middleware/telemetry.rs (transaction per request)
//!     → handlers/ (business logic + instrumentation)
//!     → response.rs (error mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod schemas;
pub mod server;

pub use request::{ApiJson, UuidRequestId, XToken, X_REQUEST_ID, X_TOKEN};
pub use response::ApiError;
pub use server::{AppState, HttpServer, ServerError};
