//! # Status HTTP API
//!
//! Read-only view of the running heartbeat, served with axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Liveness of the agent process
//! - `GET /status` - Identity being reported and report counters

mod handlers;
mod types;

pub use handlers::{health_handler, status_handler};
pub use types::{HealthResponse, StatusResponse};

use crate::heartbeat::HeartbeatService;
use axum::{Router, routing::get};
use statusheart_core::StatusHeartError;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// The running heartbeat service.
    pub service: HeartbeatService,
}

impl AppState {
    /// Create app state around `service`.
    #[must_use]
    pub fn new(service: HeartbeatService) -> Self {
        Self { service }
    }
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and request tracing.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve the status API on `addr` until the process exits.
pub async fn run_server(addr: &str, service: HeartbeatService) -> Result<(), StatusHeartError> {
    let router = create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StatusHeartError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Status API listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| StatusHeartError::IoError(format!("Server error: {}", e)))
}
