//! Backtest configuration

use backtest_core::BacktestError;

/// Strategy and lookback parameters for one backtest run
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    /// Lookback in months (30 days each) for news and the feature index
    pub backtest_months: u32,

    /// Trailing window of hourly bins the sentiment signal aggregates over
    pub sentiment_window_hours: u32,

    /// Enter YES when the windowed score is at or above this
    pub sentiment_buy_threshold: f64,

    /// Enter NO when the windowed score is at or below this
    pub sentiment_sell_threshold: f64,

    /// Ticks further than this from resolution are not entry candidates
    pub max_hours_to_resolve_for_entry: i64,

    /// Fixed stake per market in USD
    pub trade_size_usd: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            backtest_months: 6,
            sentiment_window_hours: 6,
            sentiment_buy_threshold: 0.3,
            sentiment_sell_threshold: -0.3,
            max_hours_to_resolve_for_entry: 72,
            trade_size_usd: 100.0,
        }
    }
}

impl BacktestConfig {
    /// Build a config from environment variables, falling back to defaults
    ///
    /// A variable that is set but unparseable is a configuration error, not
    /// a silent fallback.
    pub fn from_env() -> Result<Self, BacktestError> {
        let mut config = Self::default();

        if let Some(v) = read_env("BACKTEST_MONTHS")? {
            config.backtest_months = v;
        }
        if let Some(v) = read_env("SENTIMENT_WINDOW_HOURS")? {
            config.sentiment_window_hours = v;
        }
        if let Some(v) = read_env("SENTIMENT_BUY_THRESHOLD")? {
            config.sentiment_buy_threshold = v;
        }
        if let Some(v) = read_env("SENTIMENT_SELL_THRESHOLD")? {
            config.sentiment_sell_threshold = v;
        }
        if let Some(v) = read_env("MAX_HOURS_TO_RESOLVE_FOR_ENTRY")? {
            config.max_hours_to_resolve_for_entry = v;
        }
        if let Some(v) = read_env("TRADE_SIZE_USD")? {
            config.trade_size_usd = v;
        }

        Ok(config)
    }
}

fn read_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, BacktestError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| BacktestError::config(format!("Invalid value for {}: {}", name, raw))),
        Err(_) => Ok(None),
    }
}
