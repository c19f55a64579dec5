//! Market simulation engine
//!
//! Replays each market's price history against the hourly sentiment signal
//! in a single forward pass. At most one position is taken per market, at
//! the first tick that satisfies the entry rules, and held to resolution.

use std::collections::HashMap;

use backtest_core::{
    BacktestError, MarketConfig, Position, PricePoint, SentimentFeatureRow, Side, TradeResult,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::config::BacktestConfig;
use crate::storage::ArtifactStore;

/// Exact-timestamp lookup into the hourly sentiment series
///
/// Price ticks that fall between feature rows see the neutral default
/// (score 0, count 0); no interpolation is done.
pub struct SentimentIndex {
    by_ts: HashMap<i64, (f64, u32)>,
}

impl SentimentIndex {
    pub fn new(rows: &[SentimentFeatureRow]) -> Self {
        let by_ts = rows
            .iter()
            .map(|r| (r.ts.timestamp(), (r.sentiment_score, r.article_count)))
            .collect();
        Self { by_ts }
    }

    /// Sentiment at exactly `ts`, or the neutral default
    fn lookup(&self, ts: DateTime<Utc>) -> (f64, u32) {
        self.by_ts.get(&ts.timestamp()).copied().unwrap_or((0.0, 0))
    }
}

/// Sentiment-driven backtester over resolved binary markets
pub struct Backtester {
    config: BacktestConfig,
}

impl Backtester {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    /// Simulate one market against the sentiment signal
    ///
    /// `prices` must be sorted ascending; points outside
    /// `[created_at, resolve_time]` are ignored.
    #[instrument(skip(self, prices, sentiment), fields(market_id = %market.market_id))]
    pub fn run_for_market(
        &self,
        market: &MarketConfig,
        prices: &[PricePoint],
        sentiment: &SentimentIndex,
    ) -> TradeResult {
        let mut position: Option<Position> = None;

        for point in prices {
            if point.ts < market.created_at || point.ts > market.resolve_time {
                continue;
            }

            let hours_to_resolve =
                (market.resolve_time - point.ts).num_seconds() as f64 / 3600.0;
            if hours_to_resolve > self.config.max_hours_to_resolve_for_entry as f64 {
                continue;
            }

            let (sentiment_score, article_count) = sentiment.lookup(point.ts);
            let price = point.price;

            // The entry gate reads the raw YES price for both sides
            if !(0.25..=0.75).contains(&price) {
                continue;
            }

            if sentiment_score >= self.config.sentiment_buy_threshold {
                let shares = self.config.trade_size_usd / price;
                position = Some(Position {
                    side: Side::Yes,
                    entry_price: price,
                    entry_ts: point.ts,
                    shares,
                    sentiment_score_at_entry: sentiment_score,
                    article_count_at_entry: article_count,
                });
            } else if sentiment_score <= self.config.sentiment_sell_threshold {
                let no_price = 1.0 - price;
                if no_price > 0.0 {
                    let shares = self.config.trade_size_usd / no_price;
                    if shares > 0.0 {
                        position = Some(Position {
                            side: Side::No,
                            entry_price: no_price,
                            entry_ts: point.ts,
                            shares,
                            sentiment_score_at_entry: sentiment_score,
                            article_count_at_entry: article_count,
                        });
                    }
                }
            }

            // First qualifying tick wins; no re-entry, no early exit
            if position.is_some() {
                break;
            }
        }

        match position {
            Some(pos) => {
                let payoff = if pos.side.matches_outcome(&market.outcome) {
                    pos.shares
                } else {
                    0.0
                };
                let pnl = payoff - self.config.trade_size_usd;

                debug!(
                    side = %pos.side,
                    entry_price = pos.entry_price,
                    pnl,
                    "Position settled"
                );

                TradeResult {
                    market_id: market.market_id.clone(),
                    token_id: market.token_id.clone(),
                    question: market.question.clone(),
                    side: Some(pos.side),
                    entry_ts: Some(pos.entry_ts),
                    entry_price: Some(pos.entry_price),
                    resolve_time: market.resolve_time,
                    outcome: market.outcome.clone(),
                    pnl,
                    sentiment_score_at_entry: Some(pos.sentiment_score_at_entry),
                    article_count_at_entry: Some(pos.article_count_at_entry),
                }
            }
            None => TradeResult {
                market_id: market.market_id.clone(),
                token_id: market.token_id.clone(),
                question: market.question.clone(),
                side: None,
                entry_ts: None,
                entry_price: None,
                resolve_time: market.resolve_time,
                outcome: market.outcome.clone(),
                pnl: 0.0,
                sentiment_score_at_entry: None,
                article_count_at_entry: None,
            },
        }
    }

    /// Simulate every configured market, loading cached prices from the store
    ///
    /// A market whose price history is missing from the store is a fatal
    /// error naming the token.
    pub fn run_for_all_markets(
        &self,
        markets: &[MarketConfig],
        store: &ArtifactStore,
        sentiment_rows: &[SentimentFeatureRow],
    ) -> Result<Vec<TradeResult>, BacktestError> {
        let sentiment = SentimentIndex::new(sentiment_rows);
        let mut results = Vec::with_capacity(markets.len());

        for market in markets {
            let prices = store.load_prices(&market.token_id)?;
            if prices.is_empty() {
                return Err(BacktestError::missing_input(format!(
                    "Missing price history for token {}",
                    market.token_id
                )));
            }
            results.push(self.run_for_market(market, &prices, &sentiment));
        }

        info!("Simulated {} markets", results.len());

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn market(outcome: &str) -> MarketConfig {
        MarketConfig {
            token_id: "tok1".to_string(),
            market_id: "m1".to_string(),
            question: "Will the Fed cut rates?".to_string(),
            created_at: "2025-06-01T00:00:00Z".parse().unwrap(),
            resolve_time: "2025-06-10T00:00:00Z".parse().unwrap(),
            outcome: outcome.to_string(),
        }
    }

    fn point(ts: &str, price: f64) -> PricePoint {
        PricePoint::new(ts.parse().unwrap(), price)
    }

    fn sentiment_at(ts: &str, score: f64) -> SentimentFeatureRow {
        SentimentFeatureRow {
            ts: ts.parse().unwrap(),
            sentiment_score: score,
            bullish_ratio: 0.0,
            bearish_ratio: 0.0,
            article_count: 4,
        }
    }

    fn backtester() -> Backtester {
        Backtester::new(BacktestConfig::default())
    }

    #[test]
    fn test_yes_entry_and_winning_settlement() {
        // Bullish sentiment at the first 0.40 tick inside the entry
        // horizon: 250 shares, market resolves YES, pnl = 250 - 100 = 150
        let m = market("YES");
        let prices = vec![
            point("2025-06-09T12:00:00Z", 0.40),
            point("2025-06-09T13:00:00Z", 0.45),
        ];
        let sentiment = SentimentIndex::new(&[sentiment_at("2025-06-09T12:00:00Z", 0.5)]);

        let result = backtester().run_for_market(&m, &prices, &sentiment);

        assert_eq!(result.side, Some(Side::Yes));
        assert_eq!(result.entry_price, Some(0.40));
        assert_eq!(result.entry_ts, Some("2025-06-09T12:00:00Z".parse().unwrap()));
        assert!((result.pnl - 150.0).abs() < 1e-9);
        assert_eq!(result.sentiment_score_at_entry, Some(0.5));
        assert_eq!(result.article_count_at_entry, Some(4));
    }

    #[test]
    fn test_no_entry_and_winning_settlement() {
        // Bearish sentiment at a 0.40 tick: NO price 0.60, 166.67 shares,
        // market resolves NO, pnl = 166.67 - 100 = 66.67
        let m = market("NO");
        let prices = vec![
            point("2025-06-09T12:00:00Z", 0.40),
            point("2025-06-09T13:00:00Z", 0.45),
        ];
        let sentiment = SentimentIndex::new(&[sentiment_at("2025-06-09T12:00:00Z", -0.5)]);

        let result = backtester().run_for_market(&m, &prices, &sentiment);

        assert_eq!(result.side, Some(Side::No));
        assert_eq!(result.entry_price, Some(0.60));
        assert!((result.pnl - (100.0 / 0.60 - 100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_losing_settlement() {
        let m = market("NO");
        let prices = vec![point("2025-06-09T12:00:00Z", 0.40)];
        let sentiment = SentimentIndex::new(&[sentiment_at("2025-06-09T12:00:00Z", 0.5)]);

        let result = backtester().run_for_market(&m, &prices, &sentiment);

        assert_eq!(result.side, Some(Side::Yes));
        assert!((result.pnl - (-100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_price_gate_blocks_entry() {
        // Strong sentiment but price outside [0.25, 0.75]
        let m = market("YES");
        let prices = vec![
            point("2025-06-09T12:00:00Z", 0.80),
            point("2025-06-09T13:00:00Z", 0.20),
        ];
        let sentiment = SentimentIndex::new(&[
            sentiment_at("2025-06-09T12:00:00Z", 0.9),
            sentiment_at("2025-06-09T13:00:00Z", 0.9),
        ]);

        let result = backtester().run_for_market(&m, &prices, &sentiment);

        assert_eq!(result.side, None);
        assert_eq!(result.pnl, 0.0);
    }

    #[test]
    fn test_gate_reads_raw_yes_price_for_no_side() {
        // YES price 0.80 fails the gate even though the NO side at 0.20
        // would be the trade; no entry happens
        let m = market("NO");
        let prices = vec![point("2025-06-09T12:00:00Z", 0.80)];
        let sentiment = SentimentIndex::new(&[sentiment_at("2025-06-09T12:00:00Z", -0.9)]);

        let result = backtester().run_for_market(&m, &prices, &sentiment);

        assert_eq!(result.side, None);
    }

    #[test]
    fn test_entry_horizon_skips_early_ticks() {
        // First tick is 9 days from resolution (> 72h); the later tick
        // inside the horizon gets the entry
        let m = market("YES");
        let prices = vec![
            point("2025-06-01T00:00:00Z", 0.40),
            point("2025-06-08T00:00:00Z", 0.50),
        ];
        let sentiment = SentimentIndex::new(&[
            sentiment_at("2025-06-01T00:00:00Z", 0.9),
            sentiment_at("2025-06-08T00:00:00Z", 0.9),
        ]);

        let result = backtester().run_for_market(&m, &prices, &sentiment);

        assert_eq!(result.entry_ts, Some("2025-06-08T00:00:00Z".parse().unwrap()));
        assert_eq!(result.entry_price, Some(0.50));
    }

    #[test]
    fn test_first_qualifying_tick_wins() {
        let m = market("YES");
        let prices = vec![
            point("2025-06-09T12:00:00Z", 0.40),
            point("2025-06-09T13:00:00Z", 0.30),
        ];
        let sentiment = SentimentIndex::new(&[
            sentiment_at("2025-06-09T12:00:00Z", 0.5),
            sentiment_at("2025-06-09T13:00:00Z", 0.9),
        ]);

        let result = backtester().run_for_market(&m, &prices, &sentiment);

        assert_eq!(result.entry_price, Some(0.40));
        assert_eq!(result.entry_ts, Some("2025-06-09T12:00:00Z".parse().unwrap()));
    }

    #[test]
    fn test_missing_sentiment_is_neutral_not_skip() {
        // No feature row at the tick: neutral default, thresholds not met,
        // no entry, but the tick is still consumed normally
        let m = market("YES");
        let prices = vec![point("2025-06-09T12:00:00Z", 0.40)];
        let sentiment = SentimentIndex::new(&[]);

        let result = backtester().run_for_market(&m, &prices, &sentiment);

        assert_eq!(result.side, None);
        assert_eq!(result.pnl, 0.0);
    }

    #[test]
    fn test_ticks_outside_market_lifetime_ignored() {
        let m = market("YES");
        let prices = vec![
            point("2025-05-31T23:00:00Z", 0.40),
            point("2025-06-10T01:00:00Z", 0.40),
        ];
        let sentiment = SentimentIndex::new(&[
            sentiment_at("2025-05-31T23:00:00Z", 0.9),
            sentiment_at("2025-06-10T01:00:00Z", 0.9),
        ]);

        let result = backtester().run_for_market(&m, &prices, &sentiment);

        assert_eq!(result.side, None);
    }

    #[test]
    fn test_no_trade_row_is_complete() {
        let m = market("YES");
        let result = backtester().run_for_market(&m, &[], &SentimentIndex::new(&[]));

        assert_eq!(result.market_id, "m1");
        assert_eq!(result.token_id, "tok1");
        assert_eq!(result.outcome, "YES");
        assert!(result.side.is_none());
        assert!(result.entry_ts.is_none());
        assert_eq!(result.pnl, 0.0);
    }

    #[test]
    fn test_run_for_all_markets_fails_on_missing_prices() {
        let store = ArtifactStore::new_in_memory().unwrap();
        let result = backtester().run_for_all_markets(&[market("YES")], &store, &[]);

        match result {
            Err(BacktestError::MissingInput(msg)) => assert!(msg.contains("tok1")),
            other => panic!("Expected MissingInput, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_run_for_all_markets_uses_cached_prices() {
        let store = ArtifactStore::new_in_memory().unwrap();
        let m = market("YES");
        store
            .store_prices(&m.token_id, &[point("2025-06-09T12:00:00Z", 0.40)])
            .unwrap();

        let rows = vec![sentiment_at("2025-06-09T12:00:00Z", 0.5)];
        let results = backtester()
            .run_for_all_markets(&[m], &store, &rows)
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].side, Some(Side::Yes));
    }

    #[test]
    fn test_boundary_exactly_max_hours_is_eligible() {
        let m = market("YES");
        let ts = m.resolve_time - Duration::hours(72);
        let prices = vec![PricePoint::new(ts, 0.40)];
        let rows = vec![SentimentFeatureRow {
            ts,
            sentiment_score: 0.5,
            bullish_ratio: 0.0,
            bearish_ratio: 0.0,
            article_count: 1,
        }];
        let sentiment = SentimentIndex::new(&rows);

        let result = backtester().run_for_market(&m, &prices, &sentiment);

        assert_eq!(result.side, Some(Side::Yes));
    }
}
