use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::ApiResponse;
use crate::errors::AppError;
use crate::models::ChatMessage;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatInput {
    pub message: String,
}

/// GET /api/chat: Conversation so far.
pub async fn history(State(state): State<AppState>) -> Json<ApiResponse<Vec<ChatMessage>>> {
    Json(ApiResponse::ok(state.dashboard.chat_history().await))
}

/// POST /api/chat: Send a message; answers with the assistant's reply,
/// which carries the error text if the backend call failed.
pub async fn send(
    State(state): State<AppState>,
    Json(input): Json<ChatInput>,
) -> Result<Json<ApiResponse<ChatMessage>>, AppError> {
    let reply = state
        .dashboard
        .send_chat(&input.message)
        .await
        .ok_or_else(|| AppError::BadRequest("message must not be empty".into()))?;
    Ok(Json(ApiResponse::ok(reply)))
}
