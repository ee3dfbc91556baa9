use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics::gauge;

use crate::dashboard::ConnectionStatus;
use crate::AppState;

/// GET /metrics: Prometheus scrape. Point-in-time gauges are sampled here
/// rather than on every state change.
pub async fn render(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = &state.dashboard;
    let connected = dashboard.connection_status().await == ConnectionStatus::Connected;

    gauge!("analysis_running").set(if dashboard.is_analysis_running() { 1.0 } else { 0.0 });
    gauge!("backend_connected").set(if connected { 1.0 } else { 0.0 });

    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics_handle.render(),
    )
}
