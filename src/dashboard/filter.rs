use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Category, Opportunity};

/// Confidence cutoff for the `high-confidence` list filter.
pub const HIGH_CONFIDENCE_FILTER_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterType {
    #[default]
    All,
    Bullish,
    Bearish,
    HighConfidence,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::All => "all",
            FilterType::Bullish => "bullish",
            FilterType::Bearish => "bearish",
            FilterType::HighConfidence => "high-confidence",
        }
    }

    pub fn matches(&self, opp: &Opportunity) -> bool {
        match self {
            FilterType::All => true,
            FilterType::Bullish => opp.category == Category::Bullish,
            FilterType::Bearish => opp.category == Category::Bearish,
            FilterType::HighConfidence => {
                opp.confidence_score >= HIGH_CONFIDENCE_FILTER_THRESHOLD
            }
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(FilterType::All),
            "bullish" => Ok(FilterType::Bullish),
            "bearish" => Ok(FilterType::Bearish),
            "high-confidence" => Ok(FilterType::HighConfidence),
            other => Err(format!("unknown filter: {other}")),
        }
    }
}

/// Case-insensitive substring match on ticker or setup type.
fn matches_search(opp: &Opportunity, needle: &str) -> bool {
    needle.is_empty()
        || opp.ticker.to_lowercase().contains(needle)
        || opp.setup_type.to_lowercase().contains(needle)
}

/// Filtered view of `items`, in store order.
pub fn filter_opportunities<'a>(
    items: &'a [Opportunity],
    search: &str,
    filter: FilterType,
) -> Vec<&'a Opportunity> {
    let needle = search.trim().to_lowercase();
    items
        .iter()
        .filter(|opp| matches_search(opp, &needle) && filter.matches(opp))
        .collect()
}
