use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Category, Opportunity};

/// Confidence cutoff for the summary's "high confidence" count. Kept
/// separate from the list filter's cutoff even though the values agree.
pub const HIGH_CONFIDENCE_STATS_THRESHOLD: f64 = 0.70;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    /// Mean confidence as a rounded whole percentage; 0 for an empty store.
    pub avg_confidence_pct: u32,
    pub high_confidence: usize,
    /// Sum of known prices. Missing prices count as zero.
    pub total_price: Decimal,
    pub bullish: usize,
    pub bearish: usize,
}

/// Summary over the whole store, not the filtered view.
pub fn compute_stats(items: &[Opportunity]) -> DashboardStats {
    let total = items.len();

    let avg_confidence_pct = if total == 0 {
        0
    } else {
        let sum: f64 = items.iter().map(|o| o.confidence_score).sum();
        (sum / total as f64 * 100.0).round().max(0.0) as u32
    };

    DashboardStats {
        total,
        avg_confidence_pct,
        high_confidence: items
            .iter()
            .filter(|o| o.confidence_score >= HIGH_CONFIDENCE_STATS_THRESHOLD)
            .count(),
        total_price: items.iter().filter_map(|o| o.price).sum(),
        bullish: items.iter().filter(|o| o.category == Category::Bullish).count(),
        bearish: items.iter().filter(|o| o.category == Category::Bearish).count(),
    }
}
