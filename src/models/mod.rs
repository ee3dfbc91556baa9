pub mod chat;
pub mod detail;
pub mod opportunity;

pub use chat::{ChatMessage, ChatRole};
pub use detail::{
    ChartData, DetailEcho, HistoryEvent, OpportunityDetail, SetupRationale, TechnicalIndicators,
    TimelineContext,
};
pub use opportunity::{KeyIndicators, Opportunity};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Directional bucket for a setup, assigned once when a row enters the store.
///
/// Categories are exclusive. Bullish keywords win over bearish ones, so a
/// "Bearish Momentum" label is [`Category::Bullish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bullish,
    Bearish,
    Neutral,
}

const BULLISH_KEYWORDS: [&str; 2] = ["bullish", "momentum"];
const BEARISH_KEYWORDS: [&str; 2] = ["short", "bear"];

impl Category {
    pub fn from_setup_type(setup_type: &str) -> Self {
        let lower = setup_type.to_lowercase();
        if BULLISH_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Category::Bullish
        } else if BEARISH_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Category::Bearish
        } else {
            Category::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bullish => "bullish",
            Category::Bearish => "bearish",
            Category::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConfidenceLevel
// ---------------------------------------------------------------------------

/// Display tier for a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub const HIGH_THRESHOLD: f64 = 0.8;
    pub const MEDIUM_THRESHOLD: f64 = 0.6;

    pub fn from_score(score: f64) -> Self {
        if score >= Self::HIGH_THRESHOLD {
            ConfidenceLevel::High
        } else if score >= Self::MEDIUM_THRESHOLD {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Badge colour used by the UI.
    pub fn color(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "green",
            ConfidenceLevel::Medium => "yellow",
            ConfidenceLevel::Low => "orange",
        }
    }
}

/// Confidence fraction as a whole percentage, e.g. `0.856` → `86`.
pub fn confidence_percent(score: f64) -> u32 {
    (score.clamp(0.0, 1.0) * 100.0).round() as u32
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Parse a backend timestamp. The backend emits naive ISO-8601 (UTC) as well
/// as RFC 3339; anything else yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_category_keywords() {
        assert_eq!(Category::from_setup_type("Bullish Momentum"), Category::Bullish);
        assert_eq!(Category::from_setup_type("MOMENTUM continuation"), Category::Bullish);
        assert_eq!(Category::from_setup_type("Short Squeeze"), Category::Bearish);
        assert_eq!(Category::from_setup_type("Mean Reversion (Short)"), Category::Bearish);
        assert_eq!(Category::from_setup_type("Bear Flag"), Category::Bearish);
        assert_eq!(Category::from_setup_type("Breakout"), Category::Neutral);
        assert_eq!(Category::from_setup_type("Oversold Bounce"), Category::Neutral);
    }

    #[test]
    fn test_category_bullish_wins_on_mixed_label() {
        assert_eq!(Category::from_setup_type("Bearish Momentum"), Category::Bullish);
    }

    #[test]
    fn test_confidence_levels() {
        assert_eq!(ConfidenceLevel::from_score(0.85), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.8), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.79), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.6), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.59), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::Low.color(), "orange");
    }

    #[test]
    fn test_confidence_percent() {
        assert_eq!(confidence_percent(0.856), 86);
        assert_eq!(confidence_percent(0.0), 0);
        assert_eq!(confidence_percent(1.0), 100);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let naive = parse_timestamp("2024-03-01T14:30:05.123456").unwrap();
        assert_eq!((naive.year(), naive.month(), naive.day()), (2024, 3, 1));
        assert_eq!(naive.hour(), 14);

        let rfc = parse_timestamp("2024-03-01T14:30:05+02:00").unwrap();
        assert_eq!(rfc.hour(), 12);

        assert!(parse_timestamp("yesterday").is_none());
    }
}
