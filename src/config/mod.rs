use std::env;
use std::str::FromStr;

const DEFAULT_CHART_EXCHANGE: &str = "NASDAQ";
const DEFAULT_RESEARCH_QUERY: &str = "Find technical trading opportunities";
const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Output format for the tracing subscriber, from `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT`. Unset or unrecognised values fall back to text,
    /// since this runs before the subscriber exists to report anything.
    pub fn from_env() -> Self {
        env::var("LOG_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Connection settings for the backend opportunity service.
///
/// Passed explicitly to [`crate::backend::BackendClient`]; nothing in the
/// crate reads the backend location or token from globals.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub auth_token: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Backend opportunity service
    pub backend_url: String,
    pub backend_token: String,

    // Shell
    pub host: String,
    pub port: u16,
    /// Bearer token required by the shell's `/api` routes. Empty disables auth.
    pub api_token: Option<String>,

    // Dashboard behaviour
    pub chart_exchange: String,
    pub research_query: String,
    pub research_lookback_days: u32,
    pub load_on_startup: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            backend_url: normalize_base_url(
                &env::var("BACKEND_URL")
                    .map_err(|_| anyhow::anyhow!("BACKEND_URL must be set"))?,
            ),
            backend_token: env::var("AGENT_API_KEY")
                .map_err(|_| anyhow::anyhow!("AGENT_API_KEY must be set"))?,

            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            api_token: env::var("API_TOKEN").ok().filter(|t| !t.trim().is_empty()),

            chart_exchange: env::var("CHART_EXCHANGE")
                .ok()
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CHART_EXCHANGE.into()),
            research_query: env::var("RESEARCH_QUERY")
                .unwrap_or_else(|_| DEFAULT_RESEARCH_QUERY.into()),
            research_lookback_days: env::var("RESEARCH_LOOKBACK_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LOOKBACK_DAYS),
            load_on_startup: env::var("LOAD_ON_STARTUP")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
        })
    }

    /// Config for a dashboard talking to `backend_url`, with shell defaults.
    pub fn for_backend(backend_url: &str, backend_token: &str) -> Self {
        Self {
            backend_url: normalize_base_url(backend_url),
            backend_token: backend_token.to_string(),
            host: "127.0.0.1".into(),
            port: 0,
            api_token: None,
            chart_exchange: DEFAULT_CHART_EXCHANGE.into(),
            research_query: DEFAULT_RESEARCH_QUERY.into(),
            research_lookback_days: DEFAULT_LOOKBACK_DAYS,
            load_on_startup: false,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.backend_url.clone(),
            auth_token: self.backend_token.clone(),
        }
    }
}

/// Strip trailing slashes so paths can be appended with `format!("{base}/...")`.
fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
