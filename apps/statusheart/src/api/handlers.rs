//! # API Endpoint Handlers

use super::{
    AppState,
    types::{HealthResponse, StatusResponse},
};
use crate::heartbeat::REPORT_STATUS_INTERVAL;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Heartbeat status: identity being reported and report counters.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let identity = state.service.identity();

    let response = StatusResponse {
        contract: state.service.contract().to_string(),
        reporting: identity.is_established(),
        peer_id: identity.peer_id,
        nonce: identity.nonce,
        interval_secs: REPORT_STATUS_INTERVAL.as_secs(),
        stats: state.service.stats(),
    };

    (StatusCode::OK, Json(response))
}
