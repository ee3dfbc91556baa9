use serde::Serialize;

use super::status::ConnectionStatus;
use crate::models::ChatMessage;

/// State-change notifications pushed to connected dashboard clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum DashboardEvent {
    #[serde(rename = "opportunities_updated")]
    OpportunitiesUpdated { count: usize },

    #[serde(rename = "operation_failed")]
    OperationFailed { message: String },

    #[serde(rename = "analysis_started")]
    AnalysisStarted,

    #[serde(rename = "analysis_finished")]
    AnalysisFinished { success: bool },

    #[serde(rename = "detail_updated")]
    DetailUpdated { id: Option<i64> },

    #[serde(rename = "connection_changed")]
    ConnectionChanged { status: ConnectionStatus },

    #[serde(rename = "chat_message")]
    ChatMessage(ChatMessage),
}
