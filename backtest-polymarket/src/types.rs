//! Wire types for the CLOB price history API

use backtest_core::PricePoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base URL for the Polymarket CLOB API
pub const CLOB_API_BASE: &str = "https://clob.polymarket.com";

/// Response from GET /prices-history
#[derive(Debug, Clone, Deserialize)]
pub struct PricesHistoryResponse {
    /// List of timestamp/price pairs
    #[serde(default)]
    pub history: Vec<PriceHistoryPoint>,
}

/// A single price point from the CLOB API
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct PriceHistoryPoint {
    /// Unix timestamp in seconds
    pub t: i64,
    /// Price (0.0 - 1.0)
    pub p: f64,
}

impl PriceHistoryPoint {
    /// Convert to the engine's price observation type
    ///
    /// Points with out-of-range epoch seconds are dropped by the caller.
    pub fn to_price_point(self) -> Option<PricePoint> {
        let ts: DateTime<Utc> = DateTime::from_timestamp(self.t, 0)?;
        Some(PricePoint::new(ts, self.p))
    }
}
