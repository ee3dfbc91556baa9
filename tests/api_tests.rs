mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use ta_dashboard::api::router::create_router;
use ta_dashboard::config::AppConfig;
use ta_dashboard::AppState;

use common::{scenario_rows, setup, MockBackend};

async fn build_test_app(mock: MockBackend, api_token: Option<&str>) -> axum::Router {
    let (dashboard, mut config): (_, AppConfig) = setup(mock).await;
    config.api_token = api_token.map(str::to_string);

    let state = AppState {
        dashboard,
        config,
        metrics_handle: ta_dashboard::metrics::init_metrics(),
    };
    create_router(state)
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_app(MockBackend::default(), None).await;

    let (status, json) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    // Nothing probed yet
    assert_eq!(json["backend"], "checking");

    let (_, json) = send(&app, post("/api/connection/check")).await;
    assert_eq!(json["backend"], "connected");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = build_test_app(MockBackend::default(), None).await;

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_then_filtered_list() {
    let app = build_test_app(MockBackend::with_opportunities(scenario_rows()), None).await;

    let (status, json) = send(&app, post("/api/opportunities/refresh")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["count"], 2);

    let (status, json) = send(&app, get("/api/opportunities?filter=bullish")).await;
    assert_eq!(status, StatusCode::OK);
    let rows = json["data"]["opportunities"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["ticker"], "AAPL");
    assert_eq!(rows[0]["category"], "bullish");
    assert_eq!(rows[0]["confidence_color"], "green");
    assert_eq!(json["data"]["stats"]["total"], 2);

    let (_, json) = send(&app, get("/api/opportunities?search=tsla&filter=high-confidence")).await;
    assert!(json["data"]["opportunities"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_filter_rejected() {
    let app = build_test_app(MockBackend::default(), None).await;

    let (status, json) = send(&app, get("/api/opportunities?filter=sideways")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_refresh_failure_reports_banner() {
    let mock = MockBackend::default();
    mock.set_list_status(StatusCode::INTERNAL_SERVER_ERROR);
    let app = build_test_app(mock, None).await;

    let (status, json) = send(&app, post("/api/opportunities/refresh")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to load opportunities"));

    let (_, summary) = send(&app, get("/api/dashboard/summary")).await;
    assert_eq!(summary["error"], json["error"]);
    assert_eq!(summary["connection"], "checking");
}

#[tokio::test]
async fn test_run_analysis_endpoint() {
    let app = build_test_app(MockBackend::with_opportunities(scenario_rows()), None).await;

    let (status, json) = send(&app, post("/api/analysis/run")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["outcome"], "completed");
    assert_eq!(json["data"]["loaded"], 2);

    let (_, summary) = send(&app, get("/api/dashboard/summary")).await;
    assert!(summary["last_run"].is_string());
    assert_eq!(summary["analysis_running"], false);
}

#[tokio::test]
async fn test_auth_required_when_token_set() {
    let app = build_test_app(MockBackend::default(), Some("shell-token")).await;

    let (status, _) = send(&app, get("/api/dashboard/summary")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/api/dashboard/summary")
        .header("authorization", "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/api/dashboard/summary")
        .header("authorization", "Bearer shell-token")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stats"]["total"], 0);

    // Health stays public
    let (status, _) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_detail_overlay_flow() {
    let app = build_test_app(MockBackend::with_opportunities(scenario_rows()), None).await;
    send(&app, post("/api/opportunities/refresh")).await;

    let (status, json) = send(&app, post("/api/opportunities/1/detail")).await;
    assert_eq!(status, StatusCode::OK);
    let view = &json["data"];
    assert_eq!(view["status"], "loaded");
    assert_eq!(view["ticker"], "AAPL");
    assert_eq!(view["chart_symbol"], "NASDAQ:AAPL");
    // Collapsed sections carry no body
    assert!(view["indicators"].is_null());

    let (status, json) = send(&app, post("/api/detail/sections/indicators/toggle")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["section"], "indicators");
    assert_eq!(json["expanded"], true);

    let (_, json) = send(&app, get("/api/detail")).await;
    assert_eq!(json["data"]["indicators"]["rsi"]["value"], 58.0);
    assert!(json["data"]["chart"].is_null());

    let (status, _) = send(&app, post("/api/detail/sections/volume/toggle")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method("DELETE")
        .uri("/api/detail")
        .body(Body::empty())
        .unwrap();
    let (_, json) = send(&app, req).await;
    assert_eq!(json["data"]["status"], "idle");
}

#[tokio::test]
async fn test_detail_error_is_shown_in_overlay() {
    let app = build_test_app(MockBackend::default(), None).await;

    let (_, json) = send(&app, post("/api/opportunities/404/detail")).await;
    assert_eq!(json["data"]["status"], "errored");
    assert!(json["data"]["error"]
        .as_str()
        .unwrap()
        .contains("Opportunity not found"));
}

#[tokio::test]
async fn test_chat_endpoints() {
    let app = build_test_app(MockBackend::default(), None).await;

    let (status, _) = send(&app, post_json("/api/chat", serde_json::json!({ "message": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &app,
        post_json("/api/chat", serde_json::json!({ "message": "Explain MACD" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["role"], "assistant");
    assert_eq!(json["data"]["content"], "You asked about: Explain MACD");

    let (_, json) = send(&app, get("/api/chat")).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_new_opportunities_endpoint() {
    let app = build_test_app(MockBackend::with_opportunities(scenario_rows()), None).await;

    let (status, json) = send(&app, get("/api/opportunities/new?agent_name=options_analyst")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    // Hand-off read never fills the store
    let (_, summary) = send(&app, get("/api/dashboard/summary")).await;
    assert_eq!(summary["stats"]["total"], 0);
}
