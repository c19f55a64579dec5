//! Backtest engine
//!
//! Turns labeled news into an hourly sentiment signal, replays each
//! market's price history against it, and aggregates the per-market
//! results into summary statistics. Intermediate artifacts (prices,
//! labeled news, the sentiment series, trade results) are cached in a
//! SQLite store so repeat runs skip the expensive fetch/label steps.

pub mod config;
pub mod features;
pub mod simulator;
pub mod storage;
pub mod summary;

pub use config::BacktestConfig;
pub use features::build_sentiment_series;
pub use simulator::{Backtester, SentimentIndex};
pub use storage::{ArtifactStore, StoreError};
pub use summary::{summarize_trades, TradeSummary};
