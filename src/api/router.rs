use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes: no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes: require Bearer token when API_TOKEN is set
    let protected = Router::new()
        // Dashboard
        .route("/api/dashboard/summary", get(handlers::dashboard::summary))
        .route("/api/connection/check", post(handlers::health::check_backend))
        // Opportunities
        .route("/api/opportunities", get(handlers::opportunities::list))
        .route("/api/opportunities/refresh", post(handlers::opportunities::refresh))
        .route("/api/opportunities/new", get(handlers::opportunities::new_for_agent))
        .route("/api/analysis/run", post(handlers::opportunities::run_analysis))
        // Detail overlay
        .route("/api/opportunities/:id/detail", post(handlers::detail::open))
        .route("/api/detail", get(handlers::detail::show).delete(handlers::detail::close))
        .route("/api/detail/sections/:section/toggle", post(handlers::detail::toggle_section))
        // Chat
        .route("/api/chat", get(handlers::chat::history).post(handlers::chat::send))
        // WebSocket
        .route("/ws", get(handlers::ws::handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
