//! Backtest runner
//!
//! Batch pipeline: fetch price history for every configured market, fetch
//! and label macro news (both cached in the artifact store), build the
//! hourly sentiment series, replay the markets against it, and print a
//! summary. Fatal errors (missing inputs, missing credentials) propagate
//! out of main for a non-zero exit.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;
use backtest_core::{markets_from_json, LabeledArticle, MarketConfig};
use backtest_engine::{
    build_sentiment_series, summarize_trades, ArtifactStore, BacktestConfig, Backtester,
};
use backtest_news::{NewsApiClient, SentimentLabeler};
use backtest_polymarket::PolymarketClient;
use chrono::{DateTime, Duration, Utc};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting news-sentiment backtest");

    let config = BacktestConfig::from_env()?;
    let markets = load_markets()?;
    let now = Utc::now();

    let db_path =
        std::env::var("BACKTEST_DB_PATH").unwrap_or_else(|_| "data/backtest.db".to_string());
    info!("Opening artifact store at: {}", db_path);
    let store = ArtifactStore::new(&db_path)?;

    fetch_missing_prices(&store, &markets, &config, now).await?;
    let labeled = load_or_label_news(&store, &config, now).await?;

    let sentiment = build_sentiment_series(&labeled, &config, now);
    store.store_sentiment_series(&sentiment)?;

    let backtester = Backtester::new(config);
    let results = backtester.run_for_all_markets(&markets, &store, &sentiment)?;
    store.store_trade_results(&results)?;

    let summary = summarize_trades(&results);

    println!("Backtest Summary");
    println!("-----------------");
    println!("Markets: {}", markets.len());
    println!("Trades: {}", summary.num_trades);
    println!("Total PnL: {:.2}", summary.total_pnl);
    println!("Average PnL per trade: {:.2}", summary.avg_pnl);
    println!("Win rate: {:.1}%", summary.win_rate * 100.0);
    println!("Max drawdown: {:.2}", summary.max_drawdown);

    Ok(())
}

/// Load the markets config from `MARKETS_CONFIG_PATH`, falling back to
/// `markets_macro.json` in the working directory, then `data/`
fn load_markets() -> anyhow::Result<Vec<MarketConfig>> {
    let path = match std::env::var("MARKETS_CONFIG_PATH") {
        Ok(p) => PathBuf::from(p),
        Err(_) => {
            let default = PathBuf::from("markets_macro.json");
            if default.exists() {
                default
            } else {
                PathBuf::from("data/markets_macro.json")
            }
        }
    };

    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read markets config at {}", path.display()))?;
    let markets = markets_from_json(&json)?;

    info!("Loaded {} markets from {}", markets.len(), path.display());

    Ok(markets)
}

/// Fetch price history for every token not yet cached in the store
async fn fetch_missing_prices(
    store: &ArtifactStore,
    markets: &[MarketConfig],
    config: &BacktestConfig,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let token_ids: BTreeSet<&str> = markets.iter().map(|m| m.token_id.as_str()).collect();
    let start = now - Duration::days(30 * config.backtest_months as i64);
    let client = PolymarketClient::new();

    for token_id in token_ids {
        if store.has_prices(token_id)? {
            continue;
        }
        info!("Fetching price history for token {}", token_id);
        let prices = client.get_price_history(token_id, "1h", start, now).await?;
        store.store_prices(token_id, &prices)?;
    }

    Ok(())
}

/// Reuse cached labeled news if present, otherwise fetch and label
async fn load_or_label_news(
    store: &ArtifactStore,
    config: &BacktestConfig,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<LabeledArticle>> {
    if store.has_labeled_news()? {
        let cached = store.load_labeled_news()?;
        info!("Reusing {} cached labeled articles", cached.len());
        return Ok(cached);
    }

    let news_client = NewsApiClient::from_env()?;
    let start = now - Duration::days(30 * config.backtest_months as i64);
    let articles = news_client
        .fetch_macro_news(start, now, backtest_news::DEFAULT_MAX_ARTICLES)
        .await?;

    let labeler = SentimentLabeler::new()?;
    let labeled = labeler.label_articles(&articles).await;
    store.store_labeled_news(&labeled)?;

    Ok(labeled)
}
