//! Positions and per-market trade results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a binary market a position holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Yes => "yes",
            Side::No => "no",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yes" => Some(Side::Yes),
            "no" => Some(Side::No),
            _ => None,
        }
    }

    /// Whether this side pays out given a resolved outcome ("YES" / "NO")
    pub fn matches_outcome(&self, outcome: &str) -> bool {
        match self {
            Side::Yes => outcome == "YES",
            Side::No => outcome == "NO",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open position taken by the simulator
///
/// At most one per market run; immutable once created and held to
/// resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    /// Execution price of the side actually bought
    pub entry_price: f64,
    pub entry_ts: DateTime<Utc>,
    pub shares: f64,
    pub sentiment_score_at_entry: f64,
    pub article_count_at_entry: u32,
}

/// One row of backtest output, one per market
///
/// A market with no qualifying entry still produces a row; the entry fields
/// are `None` and the PnL is zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeResult {
    pub market_id: String,
    pub token_id: String,
    pub question: String,
    pub side: Option<Side>,
    pub entry_ts: Option<DateTime<Utc>>,
    pub entry_price: Option<f64>,
    pub resolve_time: DateTime<Utc>,
    pub outcome: String,
    pub pnl: f64,
    pub sentiment_score_at_entry: Option<f64>,
    pub article_count_at_entry: Option<u32>,
}
