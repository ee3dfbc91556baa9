use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dashboard::{ConnectionStatus, DashboardStats};
use crate::AppState;

#[derive(Serialize)]
pub struct DashboardSummary {
    pub stats: DashboardStats,
    pub connection: ConnectionStatus,
    pub analysis_running: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

pub async fn summary(State(state): State<AppState>) -> Json<DashboardSummary> {
    let dashboard = &state.dashboard;

    Json(DashboardSummary {
        stats: dashboard.stats().await,
        connection: dashboard.connection_status().await,
        analysis_running: dashboard.is_analysis_running(),
        last_run: dashboard.last_run().await,
        error: dashboard.error().await,
    })
}
