use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use super::ApiResponse;
use crate::dashboard::{DetailView, Section};
use crate::errors::AppError;
use crate::AppState;

/// POST /api/opportunities/:id/detail: Open the overlay and fetch the detail.
///
/// Always answers with the overlay as it stands once the fetch settles, which
/// may belong to a different item if another open raced this one.
pub async fn open(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<DetailView>> {
    let applied = state.dashboard.open_detail(id).await;
    if !applied {
        tracing::debug!(id, "Detail response superseded");
    }
    Json(ApiResponse::ok(state.dashboard.detail_view().await))
}

/// GET /api/detail: Current overlay.
pub async fn show(State(state): State<AppState>) -> Json<ApiResponse<DetailView>> {
    Json(ApiResponse::ok(state.dashboard.detail_view().await))
}

/// DELETE /api/detail: Close the overlay.
pub async fn close(State(state): State<AppState>) -> Json<ApiResponse<DetailView>> {
    state.dashboard.close_detail().await;
    Json(ApiResponse::ok(state.dashboard.detail_view().await))
}

/// POST /api/detail/sections/:section/toggle: Expand or collapse a section.
pub async fn toggle_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Result<Json<Value>, AppError> {
    let section: Section = section.parse().map_err(AppError::BadRequest)?;
    let expanded = state.dashboard.toggle_section(section).await;
    Ok(Json(json!({ "section": section, "expanded": expanded })))
}
