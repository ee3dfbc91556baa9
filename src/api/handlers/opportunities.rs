use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::ApiResponse;
use crate::dashboard::{DashboardView, FilterType, LoadOutcome, RunOutcome};
use crate::errors::AppError;
use crate::models::Opportunity;
use crate::AppState;

const DEFAULT_HANDOFF_AGENT: &str = "options_analyst";

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub filter: Option<String>,
}

/// GET /api/opportunities?search=&filter=: Filtered list view with stats.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<DashboardView>>, AppError> {
    let filter: FilterType = params
        .filter
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(AppError::BadRequest)?;
    let search = params.search.unwrap_or_default();

    let view = state.dashboard.view(&search, filter).await;
    Ok(Json(ApiResponse::ok(view)))
}

/// POST /api/opportunities/refresh: Re-read the list from the backend.
pub async fn refresh(State(state): State<AppState>) -> Json<ApiResponse<LoadOutcome>> {
    match state.dashboard.load_opportunities().await {
        LoadOutcome::Failed { message } => Json(ApiResponse::failed(
            LoadOutcome::Failed {
                message: message.clone(),
            },
            message,
        )),
        loaded => Json(ApiResponse::ok(loaded)),
    }
}

/// POST /api/analysis/run: Trigger a research run and reload.
pub async fn run_analysis(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RunOutcome>>, AppError> {
    match state.dashboard.run_analysis().await {
        RunOutcome::AlreadyRunning => {
            Err(AppError::Conflict("analysis already running".into()))
        }
        RunOutcome::Failed { message } => Ok(Json(ApiResponse::failed(
            RunOutcome::Failed {
                message: message.clone(),
            },
            message,
        ))),
        completed => Ok(Json(ApiResponse::ok(completed))),
    }
}

#[derive(Debug, Deserialize)]
pub struct HandoffParams {
    #[serde(default)]
    pub agent_name: Option<String>,
}

/// GET /api/opportunities/new?agent_name=: Rows awaiting hand-off to an agent.
pub async fn new_for_agent(
    State(state): State<AppState>,
    Query(params): Query<HandoffParams>,
) -> Result<Json<ApiResponse<Vec<Opportunity>>>, AppError> {
    let agent = params
        .agent_name
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_HANDOFF_AGENT.into());

    let rows = state.dashboard.new_opportunities(&agent).await?;
    Ok(Json(ApiResponse::ok(rows)))
}
