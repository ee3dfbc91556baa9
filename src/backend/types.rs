use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

// ---------------------------------------------------------------------------
// Opportunity rows
// ---------------------------------------------------------------------------

/// Indicator snapshot stored alongside each opportunity.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiKeyIndicators {
    #[serde(default)]
    pub rsi: Option<f64>,
    #[serde(default)]
    pub macd_histogram: Option<f64>,
    #[serde(default)]
    pub volume_ratio: Option<f64>,
    #[serde(default)]
    pub price_change_5d: Option<f64>,
    #[serde(default)]
    pub sma_20: Option<f64>,
    #[serde(default)]
    pub entry_zone: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub stop_loss: Option<String>,
}

/// A persisted opportunity as returned by `GET /opportunities`.
///
/// `id` is required: rows without one fail to decode.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiOpportunity {
    pub id: i64,
    pub ticker: String,
    pub setup_type: String,
    pub confidence_score: f64,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub volume: Option<i64>,
    #[serde(default)]
    pub key_indicators: Option<ApiKeyIndicators>,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub first_detected: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_new: Option<bool>,
    #[serde(default)]
    pub price_change_pct: Option<f64>,
    #[serde(default)]
    pub confidence_change: Option<f64>,
}

// ---------------------------------------------------------------------------
// Research trigger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ResearchRequest {
    pub query: String,
    pub lookback_days: u32,
}

/// An opportunity echoed by the research trigger. These rows are not
/// guaranteed to be persisted, so they carry no id.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResearchOpportunity {
    pub ticker: String,
    pub setup_type: String,
    pub confidence_score: f64,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResearchResponse {
    #[serde(default)]
    pub opportunities: Vec<ResearchOpportunity>,
    #[serde(default)]
    pub execution_time_seconds: Option<f64>,
    #[serde(default)]
    pub analysis_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// ---------------------------------------------------------------------------
// Opportunity detail (`GET /opportunities/{id}/details`)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiDetailEcho {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub setup_type: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiRsiReading {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub interpretation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiMacdReading {
    #[serde(default)]
    pub histogram: Option<f64>,
    #[serde(default)]
    pub interpretation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiVolumeReading {
    #[serde(default)]
    pub ratio: Option<f64>,
    #[serde(default)]
    pub interpretation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiMovingAverages {
    #[serde(default)]
    pub sma_20: Option<f64>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub distance_from_sma: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiTechnicalIndicators {
    #[serde(default)]
    pub rsi: ApiRsiReading,
    #[serde(default)]
    pub macd: ApiMacdReading,
    #[serde(default)]
    pub volume: ApiVolumeReading,
    #[serde(default)]
    pub moving_averages: ApiMovingAverages,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiSetupRationale {
    #[serde(default)]
    pub pattern_type: Option<String>,
    #[serde(default)]
    pub trigger_conditions: Vec<String>,
    #[serde(default)]
    pub confidence_explanation: Option<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiPriceLevels {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub current: Option<Decimal>,
    #[serde(default)]
    pub entry_zone: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub stop_loss: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiSupportResistance {
    #[serde(default)]
    pub support: Option<f64>,
    #[serde(default)]
    pub resistance: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiChartData {
    #[serde(default)]
    pub price_levels: ApiPriceLevels,
    #[serde(default)]
    pub support_resistance: ApiSupportResistance,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiTimelineContext {
    #[serde(default)]
    pub detected_at: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub processing_time: Option<String>,
    #[serde(default)]
    pub similar_setups_success_rate: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiHistoryEntry {
    pub timestamp: String,
    pub change_type: String,
    #[serde(default)]
    pub field_changed: Option<String>,
    #[serde(default)]
    pub old_value: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiOpportunityDetail {
    pub opportunity: ApiDetailEcho,
    #[serde(default)]
    pub technical_indicators: ApiTechnicalIndicators,
    #[serde(default)]
    pub setup_rationale: ApiSetupRationale,
    #[serde(default)]
    pub chart_data: ApiChartData,
    #[serde(default)]
    pub timeline_context: ApiTimelineContext,
    #[serde(default)]
    pub history: Vec<ApiHistoryEntry>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Accept a price as a JSON number or numeric string. Anything else
/// (null, "N/A", objects) decodes as `None` instead of failing the row.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64_retain)),
        Some(Value::String(s)) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_accepts_number_and_numeric_string() {
        let row: ApiOpportunity = serde_json::from_value(json!({
            "id": 1, "ticker": "AAPL", "setup_type": "Breakout",
            "confidence_score": 0.7, "price": 187.25
        }))
        .unwrap();
        assert_eq!(row.price, Some(Decimal::new(18725, 2)));

        let row: ApiOpportunity = serde_json::from_value(json!({
            "id": 2, "ticker": "MSFT", "setup_type": "Breakout",
            "confidence_score": 0.7, "price": " 410.5 "
        }))
        .unwrap();
        assert_eq!(row.price, Some(Decimal::new(4105, 1)));
    }

    #[test]
    fn test_non_numeric_price_is_none() {
        let row: ApiOpportunity = serde_json::from_value(json!({
            "id": 3, "ticker": "TSLA", "setup_type": "Short Squeeze",
            "confidence_score": 0.5, "price": "N/A"
        }))
        .unwrap();
        assert_eq!(row.price, None);

        let row: ApiOpportunity = serde_json::from_value(json!({
            "id": 4, "ticker": "TSLA", "setup_type": "Short Squeeze",
            "confidence_score": 0.5
        }))
        .unwrap();
        assert_eq!(row.price, None);
    }

    #[test]
    fn test_row_without_id_is_rejected() {
        let result: Result<ApiOpportunity, _> = serde_json::from_value(json!({
            "ticker": "NVDA", "setup_type": "Bullish Momentum", "confidence_score": 0.9
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_detail_tolerates_missing_sections() {
        let detail: ApiOpportunityDetail = serde_json::from_value(json!({
            "opportunity": { "price": 100.0, "confidence_score": 0.8 }
        }))
        .unwrap();
        assert!(detail.history.is_empty());
        assert!(detail.setup_rationale.trigger_conditions.is_empty());
        assert_eq!(detail.opportunity.price, Some(Decimal::from(100)));
    }
}
