pub mod api;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod metrics;
pub mod models;

use crate::config::AppConfig;
use crate::dashboard::Dashboard;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Dashboard,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
