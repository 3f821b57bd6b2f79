//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (CORS, timeout, request ID, tracing, telemetry)
//! - Bind server to listener
//! - Serve until the shutdown signal fires
//!
//! # Design Decisions
//! - Timeouts and panics are resolved inside the telemetry middleware, so
//!   every transaction it opens is finished with the status the client sees

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::handlers::{data, health, slow_operation, users};
use crate::http::middleware::telemetry_middleware;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::http::response::panic_response;
use crate::services::{DataSource, DataSourceError, UserStore};
use crate::telemetry::TelemetryFacade;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub telemetry: TelemetryFacade,
    pub users: Arc<UserStore>,
    pub data_source: DataSource,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("data source setup failed: {0}")]
    DataSource(#[from] DataSourceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for the demo API.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and telemetry.
    pub fn new(config: AppConfig, telemetry: TelemetryFacade) -> Result<Self, ServerError> {
        let config = Arc::new(config);
        let state = AppState {
            config: config.clone(),
            telemetry,
            users: Arc::new(UserStore::new(config.users.max_users)),
            data_source: DataSource::new(&config.external_api)?,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/health", get(health::health_check))
            .route("/data", get(data::get_data))
            .route("/users", post(users::create_user).get(users::list_users))
            .route("/slow-operation", get(slow_operation::slow_operation));

        let routes = Router::new()
            .route("/", get(health::root))
            .route("/health", get(health::liveness))
            .nest(&config.server.api_prefix, api);

        Self::instrument(routes, config, state.clone())
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(CorsLayer::permissive()),
            )
    }

    /// Wrap routes in the telemetry middleware, with timeout and panic
    /// handling underneath it.
    #[allow(deprecated)]
    fn instrument(routes: Router<AppState>, config: &AppConfig, state: AppState) -> Router<AppState> {
        routes
            .layer(
                ServiceBuilder::new()
                    .layer(CatchPanicLayer::custom(panic_response))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs))),
            )
            .layer(middleware::from_fn_with_state(state, telemetry_middleware))
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            api_prefix = %self.config.server.api_prefix,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
