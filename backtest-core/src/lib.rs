//! Core types for the news-sentiment Polymarket backtester
//!
//! This crate defines the shared data structures used across the backtester,
//! including market descriptors, price observations, labeled news, and the
//! per-market trade results the engine produces.

pub mod error;
pub mod features;
pub mod market;
pub mod news;
pub mod position;

pub use error::{BacktestError, BacktestResult};
pub use features::SentimentFeatureRow;
pub use market::{markets_from_json, MarketConfig, MarketRecord, PricePoint};
pub use news::{ArticleLabel, LabeledArticle, NewsArticle};
pub use position::{Position, Side, TradeResult};
