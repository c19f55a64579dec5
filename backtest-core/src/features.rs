//! Hourly sentiment feature rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One hour of aggregated news sentiment over the trailing window
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SentimentFeatureRow {
    /// Hour boundary this row describes
    pub ts: DateTime<Utc>,

    /// Mean sentiment over the trailing window, in [-1, 1]
    pub sentiment_score: f64,

    /// Fraction of windowed articles labeled bullish
    pub bullish_ratio: f64,

    /// Fraction of windowed articles labeled bearish
    pub bearish_ratio: f64,

    /// Number of relevant articles in the trailing window
    pub article_count: u32,
}
