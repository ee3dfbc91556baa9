use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::AppState;

/// GET /health: Shell liveness plus the last observed backend status.
/// Does not probe the backend.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let backend = state.dashboard.connection_status().await;
    Json(json!({ "status": "healthy", "backend": backend }))
}

/// POST /api/connection/check: Probe the backend now.
pub async fn check_backend(State(state): State<AppState>) -> Json<Value> {
    let backend = state.dashboard.check_health().await;
    Json(json!({ "backend": backend }))
}
