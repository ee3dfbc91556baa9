pub mod chat;
pub mod detail;
pub mod events;
pub mod filter;
pub mod stats;
pub mod status;
pub mod store;

pub use chat::ChatLog;
pub use detail::{chart_symbol, DetailController, DetailSections, DetailState, Section};
pub use events::DashboardEvent;
pub use filter::{filter_opportunities, FilterType, HIGH_CONFIDENCE_FILTER_THRESHOLD};
pub use stats::{compute_stats, DashboardStats, HIGH_CONFIDENCE_STATS_THRESHOLD};
pub use status::ConnectionStatus;
pub use store::OpportunityStore;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::backend::{BackendClient, BackendError, ResearchRequest};
use crate::config::AppConfig;
use crate::models::{
    ChartData, ChatMessage, ConfidenceLevel, DetailEcho, HistoryEvent, Opportunity,
    OpportunityDetail, SetupRationale, TechnicalIndicators, TimelineContext,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Knobs the dashboard needs beyond the backend connection.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub chart_exchange: String,
    pub research: ResearchRequest,
}

impl From<&AppConfig> for DashboardSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            chart_exchange: config.chart_exchange.clone(),
            research: ResearchRequest {
                query: config.research_query.clone(),
                lookback_days: config.research_lookback_days,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded { count: usize },
    /// A read started later already landed; this result was discarded.
    Superseded,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// `triggered` is how many rows the trigger echoed; `loaded` is what the
    /// follow-up list read put in the store.
    Completed { triggered: usize, loaded: usize },
    AlreadyRunning,
    Failed { message: String },
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// One list row with its display fields resolved.
#[derive(Debug, Clone, Serialize)]
pub struct OpportunityRow {
    #[serde(flatten)]
    pub opportunity: Opportunity,
    pub confidence_level: ConfidenceLevel,
    pub confidence_percent: u32,
    pub confidence_color: &'static str,
    pub rationale_summary: Option<String>,
    pub chart_symbol: String,
}

impl OpportunityRow {
    fn new(opportunity: &Opportunity, exchange: &str) -> Self {
        let level = opportunity.confidence_level();
        Self {
            confidence_level: level,
            confidence_percent: opportunity.confidence_percent(),
            confidence_color: level.color(),
            rationale_summary: opportunity.rationale_summary(),
            chart_symbol: chart_symbol(&opportunity.ticker, exchange),
            opportunity: opportunity.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub search: String,
    pub filter: FilterType,
    pub opportunities: Vec<OpportunityRow>,
    pub total_in_store: usize,
    pub stats: DashboardStats,
    pub connection: ConnectionStatus,
    pub analysis_running: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// The detail overlay as the UI renders it. Section bodies are only present
/// once the detail has loaded and the section is expanded.
#[derive(Debug, Clone, Serialize)]
pub struct DetailView {
    pub status: &'static str,
    pub id: Option<i64>,
    pub ticker: Option<String>,
    pub chart_symbol: Option<String>,
    pub error: Option<String>,
    pub sections: DetailSections,
    pub summary: Option<DetailEcho>,
    pub indicators: Option<TechnicalIndicators>,
    pub rationale: Option<SetupRationale>,
    pub chart: Option<ChartData>,
    pub timeline: Option<TimelineContext>,
    pub history: Vec<HistoryEvent>,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Client-side state for one dashboard session.
///
/// Each slice has its own lock and no lock is held across a backend call,
/// so a slow detail fetch never blocks a list refresh or a chat reply.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<Inner>,
}

struct Inner {
    client: BackendClient,
    settings: DashboardSettings,
    store: RwLock<OpportunityStore>,
    detail: Mutex<DetailController>,
    chat: Mutex<ChatLog>,
    connection: RwLock<ConnectionStatus>,
    analysis_running: AtomicBool,
    events: broadcast::Sender<DashboardEvent>,
}

/// Clears the in-flight flag when a run ends, however it ends.
struct RunGuard(Arc<Inner>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.analysis_running.store(false, Ordering::Release);
    }
}

impl Dashboard {
    pub fn new(client: BackendClient, settings: DashboardSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                client,
                settings,
                store: RwLock::new(OpportunityStore::new()),
                detail: Mutex::new(DetailController::new()),
                chat: Mutex::new(ChatLog::new()),
                connection: RwLock::new(ConnectionStatus::Checking),
                analysis_running: AtomicBool::new(false),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.inner.events.subscribe()
    }

    fn publish(&self, event: DashboardEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    // --- Connectivity -----------------------------------------------------

    pub async fn connection_status(&self) -> ConnectionStatus {
        *self.inner.connection.read().await
    }

    async fn set_connection(&self, status: ConnectionStatus) {
        let changed = {
            let mut current = self.inner.connection.write().await;
            let changed = *current != status;
            *current = status;
            changed
        };
        if changed {
            self.publish(DashboardEvent::ConnectionChanged { status });
        }
    }

    /// Probe `/health` and record the result. Never retries on its own.
    pub async fn check_health(&self) -> ConnectionStatus {
        self.set_connection(ConnectionStatus::Checking).await;

        let status = match self.inner.client.health().await {
            Ok(health) => {
                tracing::debug!(status = %health.status, "Backend health check ok");
                ConnectionStatus::Connected
            }
            Err(e) => {
                tracing::warn!(error = %e, "Backend health check failed");
                ConnectionStatus::Disconnected
            }
        };

        self.set_connection(status).await;
        status
    }

    // --- Opportunity list -------------------------------------------------

    /// Read the full list and replace the store. On failure the store keeps
    /// its previous contents and the error banner is set.
    ///
    /// Reads are ordered by when they were issued. A read that lands after a
    /// newer one has committed is dropped, success or failure.
    pub async fn load_opportunities(&self) -> LoadOutcome {
        counter!("opportunity_loads_total").increment(1);
        let ticket = self.inner.store.write().await.begin_load();

        match self.inner.client.list_opportunities().await {
            Ok(rows) => {
                let committed = {
                    let mut store = self.inner.store.write().await;
                    let committed = store.commit(ticket, rows);
                    if committed.is_some() {
                        store.clear_error();
                    }
                    committed
                };
                let Some(count) = committed else {
                    return self.superseded_load();
                };
                gauge!("opportunities_in_store").set(count as f64);
                tracing::info!(count, "Opportunities loaded");
                self.publish(DashboardEvent::OpportunitiesUpdated { count });
                LoadOutcome::Loaded { count }
            }
            Err(e) => {
                let message = {
                    let mut store = self.inner.store.write().await;
                    if store.is_superseded(ticket) {
                        None
                    } else {
                        Some(store.record_error("load opportunities", &e))
                    }
                };
                let Some(message) = message else {
                    return self.superseded_load();
                };
                counter!("opportunity_load_failures_total").increment(1);
                tracing::error!(error = %e, "Failed to load opportunities");
                self.publish(DashboardEvent::OperationFailed {
                    message: message.clone(),
                });
                LoadOutcome::Failed { message }
            }
        }
    }

    fn superseded_load(&self) -> LoadOutcome {
        counter!("stale_list_responses_total").increment(1);
        tracing::debug!("Discarding list response superseded by a newer read");
        LoadOutcome::Superseded
    }

    pub fn is_analysis_running(&self) -> bool {
        self.inner.analysis_running.load(Ordering::Acquire)
    }

    /// Trigger a research run, then re-read the list so the store only ever
    /// holds persisted, id-bearing rows. Refuses to start while another run
    /// is in flight.
    ///
    /// The run executes on its own task: dropping the returned future (a
    /// disconnected HTTP caller) does not stop the reload after the trigger.
    pub async fn run_analysis(&self) -> RunOutcome {
        if self
            .inner
            .analysis_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Analysis already running; ignoring trigger");
            return RunOutcome::AlreadyRunning;
        }

        let guard = RunGuard(self.inner.clone());
        counter!("analysis_runs_total").increment(1);
        self.publish(DashboardEvent::AnalysisStarted);

        let dashboard = self.clone();
        let run = tokio::spawn(async move {
            let outcome = dashboard.trigger_and_reload().await;
            drop(guard);

            let success = matches!(outcome, RunOutcome::Completed { .. });
            if !success {
                counter!("analysis_run_failures_total").increment(1);
            }
            dashboard.publish(DashboardEvent::AnalysisFinished { success });
            outcome
        });

        match run.await {
            Ok(outcome) => outcome,
            Err(e) => {
                // Panicked task; the guard has already been dropped.
                counter!("analysis_run_failures_total").increment(1);
                let message = self
                    .inner
                    .store
                    .write()
                    .await
                    .record_error("run analysis", &e);
                tracing::error!(error = %e, "Analysis task aborted");
                self.publish(DashboardEvent::AnalysisFinished { success: false });
                RunOutcome::Failed { message }
            }
        }
    }

    async fn trigger_and_reload(&self) -> RunOutcome {
        let triggered = match self.inner.client.research(&self.inner.settings.research).await {
            Ok(resp) => {
                tracing::info!(
                    returned = resp.opportunities.len(),
                    execution_time_secs = resp.execution_time_seconds.unwrap_or_default(),
                    "Research run finished"
                );
                resp.opportunities.len()
            }
            Err(e) => {
                let message = self
                    .inner
                    .store
                    .write()
                    .await
                    .record_error("run analysis", &e);
                tracing::error!(error = %e, "Research trigger failed");
                self.publish(DashboardEvent::OperationFailed {
                    message: message.clone(),
                });
                return RunOutcome::Failed { message };
            }
        };

        match self.load_opportunities().await {
            LoadOutcome::Loaded { count } => {
                self.inner.store.write().await.mark_run(Utc::now());
                RunOutcome::Completed {
                    triggered,
                    loaded: count,
                }
            }
            // A read issued after the trigger already committed, so the store
            // holds post-run rows either way.
            LoadOutcome::Superseded => {
                let mut store = self.inner.store.write().await;
                store.mark_run(Utc::now());
                RunOutcome::Completed {
                    triggered,
                    loaded: store.items().len(),
                }
            }
            LoadOutcome::Failed { message } => RunOutcome::Failed { message },
        }
    }

    /// Opportunities the backend has not yet handed off to `agent_name`.
    /// Read-only: the store is not touched.
    pub async fn new_opportunities(
        &self,
        agent_name: &str,
    ) -> Result<Vec<Opportunity>, BackendError> {
        let rows = self.inner.client.new_opportunities(agent_name).await?;
        Ok(rows.into_iter().map(Opportunity::from).collect())
    }

    pub async fn opportunities(&self) -> Vec<Opportunity> {
        self.inner.store.read().await.items().to_vec()
    }

    pub async fn stats(&self) -> DashboardStats {
        compute_stats(self.inner.store.read().await.items())
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.store.read().await.error().map(str::to_string)
    }

    pub async fn last_run(&self) -> Option<DateTime<Utc>> {
        self.inner.store.read().await.last_run()
    }

    /// Snapshot of everything the list page renders.
    pub async fn view(&self, search: &str, filter: FilterType) -> DashboardView {
        let connection = self.connection_status().await;
        let store = self.inner.store.read().await;
        let exchange = &self.inner.settings.chart_exchange;

        DashboardView {
            search: search.to_string(),
            filter,
            opportunities: filter_opportunities(store.items(), search, filter)
                .into_iter()
                .map(|opp| OpportunityRow::new(opp, exchange))
                .collect(),
            total_in_store: store.items().len(),
            stats: compute_stats(store.items()),
            connection,
            analysis_running: self.is_analysis_running(),
            last_run: store.last_run(),
            error: store.error().map(str::to_string),
        }
    }

    // --- Detail overlay ---------------------------------------------------

    /// Open the overlay for `id` and fetch its detail. Returns `false` when
    /// the response arrived after the overlay moved on and was discarded.
    pub async fn open_detail(&self, id: i64) -> bool {
        let ticket = self.inner.detail.lock().await.open(id);
        self.publish(DashboardEvent::DetailUpdated { id: Some(id) });

        let result = self
            .inner
            .client
            .opportunity_details(id)
            .await
            .map(OpportunityDetail::from)
            .map_err(|e| format!("Failed to load details: {e}"));

        let applied = self.inner.detail.lock().await.complete(ticket, result);
        if applied {
            self.publish(DashboardEvent::DetailUpdated { id: Some(id) });
        } else {
            counter!("stale_detail_responses_total").increment(1);
            tracing::debug!(id, "Discarding stale detail response");
        }
        applied
    }

    pub async fn close_detail(&self) {
        self.inner.detail.lock().await.close();
        self.publish(DashboardEvent::DetailUpdated { id: None });
    }

    pub async fn toggle_section(&self, section: Section) -> bool {
        let (expanded, id) = {
            let mut detail = self.inner.detail.lock().await;
            (detail.toggle(section), detail.state().id())
        };
        self.publish(DashboardEvent::DetailUpdated { id });
        expanded
    }

    pub async fn detail_state(&self) -> DetailState {
        self.inner.detail.lock().await.state().clone()
    }

    pub async fn detail_view(&self) -> DetailView {
        let (state, sections) = {
            let detail = self.inner.detail.lock().await;
            (detail.state().clone(), detail.sections())
        };

        let id = state.id();
        let listed = match id {
            Some(id) => self
                .inner
                .store
                .read()
                .await
                .get(id)
                .map(|o| o.ticker.clone()),
            None => None,
        };
        // Rows dropped by a reload still carry their ticker in the payload.
        let ticker = listed.or_else(|| match &state {
            DetailState::Loaded { detail, .. } => detail.opportunity.ticker.clone(),
            _ => None,
        });

        let mut view = DetailView {
            status: "idle",
            id,
            chart_symbol: ticker
                .as_deref()
                .map(|t| chart_symbol(t, &self.inner.settings.chart_exchange)),
            ticker,
            error: None,
            sections,
            summary: None,
            indicators: None,
            rationale: None,
            chart: None,
            timeline: None,
            history: Vec::new(),
        };

        match state {
            DetailState::Idle => {}
            DetailState::Loading { .. } => view.status = "loading",
            DetailState::Errored { message, .. } => {
                view.status = "errored";
                view.error = Some(message);
            }
            DetailState::Loaded { detail, .. } => {
                let detail = *detail;
                view.status = "loaded";
                view.summary = Some(detail.opportunity);
                view.history = detail.history;
                view.indicators = sections.indicators.then_some(detail.technical_indicators);
                view.rationale = sections.rationale.then_some(detail.setup_rationale);
                view.chart = sections.chart.then_some(detail.chart_data);
                view.timeline = sections.timeline.then_some(detail.timeline_context);
            }
        }

        view
    }

    // --- Chat -------------------------------------------------------------

    /// Send `text` to the agent. Blank input is ignored and returns `None`.
    /// A failed reply becomes an assistant message carrying the error.
    pub async fn send_chat(&self, text: &str) -> Option<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let user = ChatMessage::user(text);
        self.inner.chat.lock().await.push(user.clone());
        self.publish(DashboardEvent::ChatMessage(user));

        let reply = match self.inner.client.chat(text).await {
            Ok(resp) => {
                let reply = ChatMessage::assistant(resp.response);
                self.inner.chat.lock().await.push(reply.clone());
                reply
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat request failed");
                self.inner.chat.lock().await.push_failure(&e)
            }
        };

        self.publish(DashboardEvent::ChatMessage(reply.clone()));
        Some(reply)
    }

    pub async fn chat_history(&self) -> Vec<ChatMessage> {
        self.inner.chat.lock().await.messages().to_vec()
    }
}
