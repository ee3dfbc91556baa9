use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::Notify;

use ta_dashboard::backend::BackendClient;
use ta_dashboard::config::AppConfig;
use ta_dashboard::dashboard::{Dashboard, DashboardSettings};

pub const BACKEND_TOKEN: &str = "test-agent-key";

/// Holds a request open until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub requested: Notify,
    pub release: Notify,
}

/// Scriptable stand-in for the backend opportunity service.
#[derive(Default)]
pub struct MockInner {
    pub list_status: Mutex<Option<StatusCode>>,
    pub list_gate: Mutex<Option<Arc<Gate>>>,
    pub opportunities: Mutex<Value>,
    pub after_research: Mutex<Option<Value>>,
    pub research_status: Mutex<Option<StatusCode>>,
    pub research_gate: Mutex<Option<Arc<Gate>>>,
    pub detail_gates: Mutex<HashMap<i64, Arc<Gate>>>,
    pub chat_status: Mutex<Option<StatusCode>>,
    pub list_calls: AtomicUsize,
    pub research_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MockBackend(pub Arc<MockInner>);

#[allow(dead_code)]
impl MockBackend {
    pub fn with_opportunities(rows: Value) -> Self {
        let mock = Self::default();
        *mock.0.opportunities.lock().unwrap() = rows;
        mock
    }

    pub fn set_list_status(&self, status: StatusCode) {
        *self.0.list_status.lock().unwrap() = Some(status);
    }

    pub fn set_research_status(&self, status: StatusCode) {
        *self.0.research_status.lock().unwrap() = Some(status);
    }

    pub fn set_chat_status(&self, status: StatusCode) {
        *self.0.chat_status.lock().unwrap() = Some(status);
    }

    /// Rows the list endpoint serves once a research run has happened.
    pub fn set_after_research(&self, rows: Value) {
        *self.0.after_research.lock().unwrap() = Some(rows);
    }

    /// Hold the next list read after it has taken its snapshot of the rows.
    pub fn gate_next_list(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.0.list_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn set_opportunities(&self, rows: Value) {
        *self.0.opportunities.lock().unwrap() = rows;
    }

    pub fn gate_research(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.0.research_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_detail(&self, id: i64) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.0.detail_gates.lock().unwrap().insert(id, gate.clone());
        gate
    }

    pub fn list_calls(&self) -> usize {
        self.0.list_calls.load(Ordering::SeqCst)
    }

    pub fn research_calls(&self) -> usize {
        self.0.research_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.0.detail_calls.load(Ordering::SeqCst)
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {BACKEND_TOKEN}"))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Invalid authentication token" })),
    )
        .into_response()
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "technical-researcher", "analysis": "real" }))
}

async fn list(State(mock): State<MockBackend>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    mock.0.list_calls.fetch_add(1, Ordering::SeqCst);

    let status = *mock.0.list_status.lock().unwrap();
    let rows = mock.0.opportunities.lock().unwrap().clone();

    let gate = mock.0.list_gate.lock().unwrap().take();
    if let Some(gate) = gate {
        gate.requested.notify_one();
        gate.release.notified().await;
    }

    if let Some(status) = status {
        return (
            status,
            Json(json!({ "detail": "Failed to retrieve opportunities: database is locked" })),
        )
            .into_response();
    }

    Json(rows).into_response()
}

async fn details(
    State(mock): State<MockBackend>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    mock.0.detail_calls.fetch_add(1, Ordering::SeqCst);

    let gate = mock.0.detail_gates.lock().unwrap().get(&id).cloned();
    if let Some(gate) = gate {
        gate.requested.notify_one();
        gate.release.notified().await;
    }

    if id == 404 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Opportunity not found" })),
        )
            .into_response();
    }

    Json(detail_payload(id)).into_response()
}

async fn research(State(mock): State<MockBackend>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    mock.0.research_calls.fetch_add(1, Ordering::SeqCst);

    let gate = mock.0.research_gate.lock().unwrap().clone();
    if let Some(gate) = gate {
        gate.requested.notify_one();
        gate.release.notified().await;
    }

    if let Some(status) = *mock.0.research_status.lock().unwrap() {
        return (status, Json(json!({ "detail": "Research failed: yfinance timeout" }))).into_response();
    }

    if let Some(rows) = mock.0.after_research.lock().unwrap().take() {
        *mock.0.opportunities.lock().unwrap() = rows;
    }

    assert!(body["query"].is_string());
    assert!(body["lookback_days"].is_number());

    Json(json!({
        "opportunities": [
            { "ticker": "NVDA", "setup_type": "Bullish Momentum", "confidence_score": 0.82, "price": 912.4,
              "volume": 1000, "key_indicators": {}, "rationale": "fresh", "timeframe": "3-7 days" },
            { "ticker": "XOM", "setup_type": "Breakout", "confidence_score": 0.74, "price": 118.2,
              "volume": 1000, "key_indicators": {}, "rationale": "fresh", "timeframe": "1-3 days" }
        ],
        "execution_time_seconds": 9.4,
        "analysis_type": "Technical Analysis"
    }))
    .into_response()
}

async fn chat(State(mock): State<MockBackend>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if let Some(status) = *mock.0.chat_status.lock().unwrap() {
        return (status, Json(json!({ "detail": "Chat failed: model offline" }))).into_response();
    }

    let message = body["message"].as_str().unwrap_or_default();
    Json(json!({
        "response": format!("You asked about: {message}"),
        "timestamp": "2024-05-02T15:04:05.000001"
    }))
    .into_response()
}

/// Detail body whose echoed price is `id * 10`.
pub fn detail_payload(id: i64) -> Value {
    json!({
        "opportunity": {
            "id": id, "ticker": format!("T{id}"), "price": (id * 10) as f64,
            "confidence_score": 0.8, "setup_type": "Breakout", "timeframe": "1-3 days"
        },
        "technical_indicators": {
            "rsi": { "value": 58.0, "interpretation": "Neutral (58.0) - No extreme momentum condition" },
            "macd": { "histogram": 0.21, "interpretation": "Bullish (0.210) - Momentum is increasing" },
            "volume": { "ratio": 1.7, "interpretation": "High volume (1.7x) - Strong interest/conviction" },
            "moving_averages": { "sma_20": 100.0, "current_price": 104.0, "distance_from_sma": 4.0 }
        },
        "setup_rationale": {
            "pattern_type": "Breakout",
            "trigger_conditions": ["RSI 58.0 indicates neutral conditions", "Volume ratio 1.7x average"],
            "confidence_explanation": "Based on technical confluence",
            "risk_factors": ["Market volatility may affect setup timing"]
        },
        "chart_data": {
            "price_levels": { "current": 104.0, "entry_zone": "$104.00 - $105.04", "target": "$108.16", "stop_loss": "$98.00" },
            "support_resistance": { "support": 100.0, "resistance": 109.2 }
        },
        "timeline_context": {
            "detected_at": "2024-05-02T15:04:05.000001",
            "agent_name": "Technical Researcher",
            "processing_time": "~8-12 seconds",
            "similar_setups_success_rate": "75%",
            "last_updated": "2024-05-03T09:00:00"
        },
        "history": [
            { "timestamp": "2024-05-03T09:00:00", "change_type": "updated", "field_changed": "price",
              "old_value": "101.0", "new_value": "104.0" },
            { "timestamp": "2024-05-02T15:04:05", "change_type": "created", "field_changed": "created" }
        ]
    })
}

/// The two-row store used across tests: a bullish AAPL and a bearish TSLA.
#[allow(dead_code)]
pub fn scenario_rows() -> Value {
    json!([
        { "id": 1, "ticker": "AAPL", "setup_type": "Bullish Momentum", "confidence_score": 0.85,
          "price": 189.5, "volume": 52000000,
          "key_indicators": { "rsi": 62.3, "volume_ratio": 1.4, "target": "$198.98", "stop_loss": "$183.82" },
          "rationale": "Price above moving averages with MACD bullish crossover.", "timeframe": "3-7 days",
          "first_detected": "2024-05-02T15:04:05.000001", "last_updated": "2024-05-02T15:04:05.000001",
          "status": "active", "is_new": true, "price_change_pct": 0.0, "confidence_change": 0.0 },
        { "id": 2, "ticker": "TSLA", "setup_type": "Short Squeeze", "confidence_score": 0.55,
          "price": 171.1, "volume": 98000000,
          "key_indicators": { "rsi": 74.0, "volume_ratio": 2.1, "target": "$160.00", "stop_loss": "$176.23" },
          "rationale": "Overbought conditions.", "timeframe": "2-4 days",
          "status": "active", "is_new": false }
    ])
}

/// Start the mock on an ephemeral port and return its base URL.
pub async fn spawn_backend(mock: MockBackend) -> String {
    let app = Router::new()
        .route("/health", get(health))
        .route("/opportunities", get(list))
        .route("/opportunities/new", get(list))
        .route("/opportunities/:id/details", get(details))
        .route("/research", post(research))
        .route("/chat", post(chat))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().expect("mock backend has no address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock backend crashed");
    });

    format!("http://{addr}")
}

pub fn build_dashboard(config: &AppConfig) -> Dashboard {
    let client = BackendClient::new(reqwest::Client::new(), &config.client_config());
    Dashboard::new(client, DashboardSettings::from(config))
}

/// Spawn a mock backend and a dashboard wired to it.
#[allow(dead_code)]
pub async fn setup(mock: MockBackend) -> (Dashboard, AppConfig) {
    let url = spawn_backend(mock).await;
    let config = AppConfig::for_backend(&url, BACKEND_TOKEN);
    (build_dashboard(&config), config)
}
