use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{confidence_percent, parse_timestamp, Category, ConfidenceLevel};
use crate::backend::types::ApiOpportunity;

/// Characters of rationale shown in list views.
pub const RATIONALE_SUMMARY_CHARS: usize = 100;

/// Display strings for trade levels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyIndicators {
    pub entry_zone: Option<String>,
    pub target: Option<String>,
    pub stop_loss: Option<String>,
    pub macd_histogram: Option<f64>,
    pub price_change_5d: Option<f64>,
    pub sma_20: Option<f64>,
}

/// A persisted trade setup held in the opportunity store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: i64,
    pub ticker: String,
    pub setup_type: String,
    pub category: Category,
    pub price: Option<Decimal>,
    pub confidence_score: f64,
    pub timeframe: Option<String>,
    pub rsi: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub volume: Option<i64>,
    pub rationale: Option<String>,
    pub key_indicators: KeyIndicators,
    pub first_detected: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub is_new: bool,
}

impl Opportunity {
    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.confidence_score)
    }

    pub fn confidence_percent(&self) -> u32 {
        confidence_percent(self.confidence_score)
    }

    /// Rationale cut to [`RATIONALE_SUMMARY_CHARS`] characters, with `...`
    /// appended when something was cut.
    pub fn rationale_summary(&self) -> Option<String> {
        self.rationale.as_deref().map(|text| {
            let mut chars = text.chars();
            let head: String = chars.by_ref().take(RATIONALE_SUMMARY_CHARS).collect();
            if chars.next().is_some() {
                format!("{head}...")
            } else {
                head
            }
        })
    }
}

impl From<ApiOpportunity> for Opportunity {
    fn from(row: ApiOpportunity) -> Self {
        let indicators = row.key_indicators.unwrap_or_default();
        let category = Category::from_setup_type(&row.setup_type);

        Self {
            id: row.id,
            ticker: row.ticker,
            setup_type: row.setup_type,
            category,
            price: row.price,
            confidence_score: row.confidence_score,
            timeframe: row.timeframe,
            rsi: indicators.rsi,
            volume_ratio: indicators.volume_ratio,
            volume: row.volume,
            rationale: row.rationale,
            key_indicators: KeyIndicators {
                entry_zone: indicators.entry_zone,
                target: indicators.target,
                stop_loss: indicators.stop_loss,
                macd_histogram: indicators.macd_histogram,
                price_change_5d: indicators.price_change_5d,
                sma_20: indicators.sma_20,
            },
            first_detected: row.first_detected.as_deref().and_then(parse_timestamp),
            last_updated: row.last_updated.as_deref().and_then(parse_timestamp),
            is_new: row.is_new.unwrap_or(false),
        }
    }
}
