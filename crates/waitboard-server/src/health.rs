//! Liveness probe.
//!
//! Endpoint: `GET /health`
//! Response: JSON with status, version, uptime and connected screens.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Body of the health response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Seconds since the server state was created.
    pub uptime_seconds: i64,
    /// Currently connected display clients.
    pub listeners: usize,
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime_seconds = Utc::now()
        .signed_duration_since(state.started_at)
        .num_seconds()
        .max(0);

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds,
        listeners: state.board.listener_count(),
    })
}
