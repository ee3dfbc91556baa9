use ta_dashboard::api::router::create_router;
use ta_dashboard::backend::BackendClient;
use ta_dashboard::config::{AppConfig, LogFormat};
use ta_dashboard::dashboard::{Dashboard, DashboardSettings, LoadOutcome};
use ta_dashboard::metrics::init_metrics;
use ta_dashboard::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);
    let metrics_handle = init_metrics();

    let client = BackendClient::new(reqwest::Client::new(), &config.client_config());
    let dashboard = Dashboard::new(client, DashboardSettings::from(&config));

    if config.api_token.is_none() {
        tracing::warn!("API_TOKEN is not set; dashboard API is unauthenticated");
    }

    // --- Page-load equivalent: probe the backend and read the list once ---
    if config.load_on_startup {
        let status = dashboard.check_health().await;
        tracing::info!(backend = %config.backend_url, %status, "Backend health checked");

        match dashboard.load_opportunities().await {
            LoadOutcome::Loaded { count } => {
                tracing::info!(count, "Initial opportunity list loaded");
            }
            LoadOutcome::Failed { message } => {
                tracing::warn!(%message, "Initial opportunity load failed; serving empty list");
            }
            LoadOutcome::Superseded => {}
        }
    }

    let state = AppState {
        dashboard,
        config,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Dashboard listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let json = LogFormat::from_env() == LogFormat::Json;

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();
}
