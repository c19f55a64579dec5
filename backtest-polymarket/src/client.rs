//! Polymarket CLOB API client
//!
//! Fetches historical prices for a single outcome token. Only public
//! endpoints are used; no credentials are required.

use crate::types::{PricesHistoryResponse, CLOB_API_BASE};
use backtest_core::{BacktestError, PricePoint};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Polymarket CLOB client
#[derive(Clone)]
pub struct PolymarketClient {
    client: Client,
    clob_url: String,
}

impl PolymarketClient {
    /// Create a new client against the production CLOB API
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            clob_url: CLOB_API_BASE.to_string(),
        }
    }

    /// Create a client against a custom base URL (used in tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            clob_url: base_url.into(),
        }
    }

    /// Get price history for a token at a named interval over a time range
    ///
    /// # Arguments
    /// * `token_id` - The CLOB token ID (YES token)
    /// * `interval` - Duration string: "1m", "1h", "6h", "1d", "1w", "max"
    /// * `start` / `end` - Range bounds, passed as epoch seconds
    ///
    /// Returns observations sorted ascending by timestamp. An empty history
    /// is not an error; the simulator decides whether that is fatal.
    #[instrument(skip(self))]
    pub async fn get_price_history(
        &self,
        token_id: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, BacktestError> {
        let url = format!(
            "{}/prices-history?market={}&interval={}&startTs={}&endTs={}",
            self.clob_url,
            token_id,
            interval,
            start.timestamp(),
            end.timestamp()
        );

        self.fetch_history(&url).await
    }

    /// Get price history over a time range at an explicit fidelity
    ///
    /// # Arguments
    /// * `fidelity_minutes` - Granularity in minutes (lower = more data
    ///   points); `None` lets the API pick
    #[instrument(skip(self))]
    pub async fn get_price_history_with_fidelity(
        &self,
        token_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        fidelity_minutes: Option<u32>,
    ) -> Result<Vec<PricePoint>, BacktestError> {
        let mut url = format!(
            "{}/prices-history?market={}&startTs={}&endTs={}",
            self.clob_url,
            token_id,
            start.timestamp(),
            end.timestamp()
        );
        if let Some(fidelity) = fidelity_minutes {
            url.push_str(&format!("&fidelity={}", fidelity));
        }

        self.fetch_history(&url).await
    }

    async fn fetch_history(&self, url: &str) -> Result<Vec<PricePoint>, BacktestError> {
        debug!("Fetching Polymarket price history from: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            BacktestError::network(format!("Failed to fetch price history: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BacktestError::api(format!(
                "CLOB API error ({}): {}",
                status, body
            )));
        }

        let prices_response: PricesHistoryResponse = response.json().await.map_err(|e| {
            BacktestError::parse(format!("Failed to parse price history response: {}", e))
        })?;

        let mut prices: Vec<PricePoint> = prices_response
            .history
            .into_iter()
            .filter_map(|point| {
                let converted = point.to_price_point();
                if converted.is_none() {
                    warn!("Dropping price point with invalid timestamp: {}", point.t);
                }
                converted
            })
            .collect();

        prices.sort_by_key(|p| p.ts);

        debug!("Fetched {} price points", prices.len());

        Ok(prices)
    }
}

impl Default for PolymarketClient {
    fn default() -> Self {
        Self::new()
    }
}
