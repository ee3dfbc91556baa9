use std::time::Instant;

use metrics::{counter, histogram};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::types::{
    ApiOpportunity, ApiOpportunityDetail, ChatRequest, ChatResponse, HealthResponse,
    ResearchRequest, ResearchResponse,
};
use crate::config::ClientConfig;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Client for the backend opportunity service.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    auth_token: String,
}

impl BackendClient {
    pub fn new(http: Client, config: &ClientConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authenticated(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.auth_token)
    }

    /// Liveness probe. Unauthenticated.
    pub async fn health(&self) -> Result<HealthResponse, BackendError> {
        let url = format!("{}/health", self.base_url);
        self.execute("health", self.http.get(&url)).await
    }

    /// Fetch every persisted opportunity.
    pub async fn list_opportunities(&self) -> Result<Vec<ApiOpportunity>, BackendError> {
        let url = format!("{}/opportunities", self.base_url);
        self.execute("list_opportunities", self.authenticated(self.http.get(&url)))
            .await
    }

    /// Fetch opportunities not yet handed off to `agent_name`.
    pub async fn new_opportunities(
        &self,
        agent_name: &str,
    ) -> Result<Vec<ApiOpportunity>, BackendError> {
        let url = Url::parse_with_params(
            &format!("{}/opportunities/new", self.base_url),
            &[("agent_name", agent_name)],
        )
        .map_err(|e| BackendError::InvalidUrl(e.to_string()))?;

        self.execute("new_opportunities", self.authenticated(self.http.get(url)))
            .await
    }

    /// Fetch the full analysis payload for one opportunity.
    pub async fn opportunity_details(
        &self,
        id: i64,
    ) -> Result<ApiOpportunityDetail, BackendError> {
        let url = format!("{}/opportunities/{}/details", self.base_url, id);
        self.execute("opportunity_details", self.authenticated(self.http.get(&url)))
            .await
    }

    /// Ask the backend to recompute opportunities.
    pub async fn research(
        &self,
        request: &ResearchRequest,
    ) -> Result<ResearchResponse, BackendError> {
        let url = format!("{}/research", self.base_url);
        self.execute(
            "research",
            self.authenticated(self.http.post(&url).json(request)),
        )
        .await
    }

    /// Forward a chat message to the agent.
    pub async fn chat(&self, message: &str) -> Result<ChatResponse, BackendError> {
        let url = format!("{}/chat", self.base_url);
        let body = ChatRequest {
            message: message.to_string(),
        };
        self.execute("chat", self.authenticated(self.http.post(&url).json(&body)))
            .await
    }

    /// Send a request, record metrics, and decode a 2xx JSON body.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        req: RequestBuilder,
    ) -> Result<T, BackendError> {
        let started = Instant::now();
        counter!("backend_requests_total", "operation" => operation).increment(1);

        let result = send_and_decode(req).await;

        histogram!("backend_request_seconds", "operation" => operation)
            .record(started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            counter!("backend_request_failures_total", "operation" => operation).increment(1);
            tracing::warn!(operation, error = %e, "Backend request failed");
        }

        result
    }
}

async fn send_and_decode<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, BackendError> {
    let resp: Response = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(BackendError::Status {
            status,
            body: error_detail(&body),
        });
    }

    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pull `detail` out of a JSON error body, falling back to the raw text.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
