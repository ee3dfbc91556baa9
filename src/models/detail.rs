use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::parse_timestamp;
use crate::backend::types::{ApiHistoryEntry, ApiOpportunityDetail};

/// Summary fields as echoed by the detail endpoint.
///
/// Kept apart from [`super::Opportunity`] so a detail fetch can never
/// overwrite what the list shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailEcho {
    pub ticker: Option<String>,
    pub price: Option<Decimal>,
    pub confidence_score: Option<f64>,
    pub setup_type: Option<String>,
    pub timeframe: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub value: Option<f64>,
    pub interpretation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverages {
    pub sma_20: Option<f64>,
    pub current_price: Option<f64>,
    pub distance_from_sma: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    pub rsi: IndicatorReading,
    /// `value` holds the MACD histogram.
    pub macd: IndicatorReading,
    /// `value` holds the volume ratio against the 20-day average.
    pub volume: IndicatorReading,
    pub moving_averages: MovingAverages,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupRationale {
    pub pattern_type: Option<String>,
    pub trigger_conditions: Vec<String>,
    pub confidence_explanation: Option<String>,
    pub risk_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub current: Option<Decimal>,
    pub entry_zone: Option<String>,
    pub target: Option<String>,
    pub stop_loss: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub price_levels: PriceLevels,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineContext {
    pub detected_at: Option<DateTime<Utc>>,
    pub agent_name: Option<String>,
    pub processing_time: Option<String>,
    pub similar_setups_success_rate: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// One change recorded against an opportunity, in server order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub timestamp: Option<DateTime<Utc>>,
    pub change_type: String,
    pub field_changed: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Full analysis for one opportunity, fetched on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityDetail {
    pub opportunity: DetailEcho,
    pub technical_indicators: TechnicalIndicators,
    pub setup_rationale: SetupRationale,
    pub chart_data: ChartData,
    pub timeline_context: TimelineContext,
    pub history: Vec<HistoryEvent>,
}

impl From<ApiHistoryEntry> for HistoryEvent {
    fn from(entry: ApiHistoryEntry) -> Self {
        Self {
            timestamp: parse_timestamp(&entry.timestamp),
            change_type: entry.change_type,
            field_changed: entry.field_changed,
            old_value: entry.old_value,
            new_value: entry.new_value,
        }
    }
}

impl From<ApiOpportunityDetail> for OpportunityDetail {
    fn from(api: ApiOpportunityDetail) -> Self {
        let indicators = api.technical_indicators;
        let chart = api.chart_data;
        let timeline = api.timeline_context;

        Self {
            opportunity: DetailEcho {
                ticker: api.opportunity.ticker,
                price: api.opportunity.price,
                confidence_score: api.opportunity.confidence_score,
                setup_type: api.opportunity.setup_type,
                timeframe: api.opportunity.timeframe,
            },
            technical_indicators: TechnicalIndicators {
                rsi: IndicatorReading {
                    value: indicators.rsi.value,
                    interpretation: indicators.rsi.interpretation,
                },
                macd: IndicatorReading {
                    value: indicators.macd.histogram,
                    interpretation: indicators.macd.interpretation,
                },
                volume: IndicatorReading {
                    value: indicators.volume.ratio,
                    interpretation: indicators.volume.interpretation,
                },
                moving_averages: MovingAverages {
                    sma_20: indicators.moving_averages.sma_20,
                    current_price: indicators.moving_averages.current_price,
                    distance_from_sma: indicators.moving_averages.distance_from_sma,
                },
            },
            setup_rationale: SetupRationale {
                pattern_type: api.setup_rationale.pattern_type,
                trigger_conditions: api.setup_rationale.trigger_conditions,
                confidence_explanation: api.setup_rationale.confidence_explanation,
                risk_factors: api.setup_rationale.risk_factors,
            },
            chart_data: ChartData {
                price_levels: PriceLevels {
                    current: chart.price_levels.current,
                    entry_zone: chart.price_levels.entry_zone,
                    target: chart.price_levels.target,
                    stop_loss: chart.price_levels.stop_loss,
                },
                support: chart.support_resistance.support,
                resistance: chart.support_resistance.resistance,
            },
            timeline_context: TimelineContext {
                detected_at: timeline.detected_at.as_deref().and_then(parse_timestamp),
                agent_name: timeline.agent_name,
                processing_time: timeline.processing_time,
                similar_setups_success_rate: timeline.similar_setups_success_rate,
                last_updated: timeline.last_updated.as_deref().and_then(parse_timestamp),
            },
            history: api.history.into_iter().map(HistoryEvent::from).collect(),
        }
    }
}
