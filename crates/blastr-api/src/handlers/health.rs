//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

use crate::auth::AppState;

/// Basic health check
///
/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// Liveness probe
///
/// GET /health/live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe - verifies database connectivity
///
/// GET /health/ready
pub async fn readiness(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    match state.db_pool.health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "ready"}))),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "unavailable", "detail": e.to_string()})),
        ),
    }
}
