//! Market descriptors and price observations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BacktestError;

/// Immutable descriptor of one binary-outcome market under backtest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// CLOB token ID of the YES outcome (identifies the price feed)
    pub token_id: String,

    /// Market identifier; falls back to the condition ID or the token ID
    /// when the source record omits it
    pub market_id: String,

    /// Human-readable market question
    pub question: String,

    /// When the market opened for trading
    pub created_at: DateTime<Utc>,

    /// When the market resolves
    pub resolve_time: DateTime<Utc>,

    /// Resolved outcome, normalized to "YES" / "NO"
    pub outcome: String,
}

/// Raw market record as it appears in the markets configuration file
///
/// Mirrors the on-disk JSON; converted to [`MarketConfig`] for use in the
/// engine.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketRecord {
    pub token_id: String,

    #[serde(default)]
    pub market_id: Option<String>,

    #[serde(default)]
    pub condition_id: Option<String>,

    pub question: String,

    pub created_at: DateTime<Utc>,

    pub resolve_time: DateTime<Utc>,

    pub outcome: String,
}

impl MarketConfig {
    /// Build a validated market config from a raw record
    ///
    /// The market ID resolution chain is `market_id` -> `condition_id` ->
    /// `token_id`; the outcome is case-normalized to upper case.
    pub fn from_record(record: MarketRecord) -> Result<Self, BacktestError> {
        if record.created_at > record.resolve_time {
            return Err(BacktestError::config(format!(
                "Market {}: created_at {} is after resolve_time {}",
                record.token_id, record.created_at, record.resolve_time
            )));
        }

        let market_id = record
            .market_id
            .or(record.condition_id)
            .unwrap_or_else(|| record.token_id.clone());

        Ok(Self {
            token_id: record.token_id,
            market_id,
            question: record.question,
            created_at: record.created_at,
            resolve_time: record.resolve_time,
            outcome: record.outcome.to_uppercase(),
        })
    }
}

/// Parse a markets configuration file (a JSON list of records)
pub fn markets_from_json(json: &str) -> Result<Vec<MarketConfig>, BacktestError> {
    let records: Vec<MarketRecord> = serde_json::from_str(json)
        .map_err(|e| BacktestError::parse(format!("Failed to parse markets config: {}", e)))?;

    records.into_iter().map(MarketConfig::from_record).collect()
}

/// A single observation of the market-implied YES probability
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PricePoint {
    /// Observation timestamp
    pub ts: DateTime<Utc>,
    /// YES price in [0, 1]
    pub price: f64,
}

impl PricePoint {
    pub fn new(ts: DateTime<Utc>, price: f64) -> Self {
        Self { ts, price }
    }
}
