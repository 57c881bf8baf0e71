use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::queue::QueueDepths;
use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the project store is reachable.
    pub store_healthy: bool,
    /// Jobs waiting per queue.
    pub queues: QueueDepths,
}

/// GET /health -- returns service health and queue depths.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_healthy = state.queue.store_healthy().await;
    let status = if store_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        store_healthy,
        queues: state.queue.depths().await,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
