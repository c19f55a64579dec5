//! Hourly sentiment feature builder
//!
//! Aggregates labeled news into a contiguous hourly series over the
//! configured lookback. Each row carries the trailing-window mean sentiment
//! and bullish/bearish ratios; hours with no coverage get zero-valued rows
//! so the simulator can look up any hour in range.

use std::collections::HashMap;

use backtest_core::{LabeledArticle, SentimentFeatureRow};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::config::BacktestConfig;

const SECS_PER_HOUR: i64 = 3600;

/// Per-hour event aggregates before windowing
#[derive(Debug, Clone, Copy, Default)]
struct HourBin {
    article_count: i64,
    sentiment_sum: i64,
    bullish: i64,
    bearish: i64,
}

/// Build the hourly sentiment series from labeled articles
///
/// The index runs from `now − 30 × backtest_months days` to `now`, both
/// ends floored to the hour, at fixed 1h spacing. Only `relevance == 1`
/// articles contribute. The trailing window spans
/// `sentiment_window_hours` bins inclusive of the current hour; partial
/// windows at the start of the series are valid. An empty window yields
/// zero ratios (the denominator is clamped to 1).
///
/// Deterministic: the same articles, config, and anchor produce an
/// identical series.
pub fn build_sentiment_series(
    articles: &[LabeledArticle],
    config: &BacktestConfig,
    now: DateTime<Utc>,
) -> Vec<SentimentFeatureRow> {
    let relevant: Vec<&LabeledArticle> = articles.iter().filter(|a| a.relevance == 1).collect();
    if relevant.is_empty() {
        return Vec::new();
    }

    let end_hour = now.timestamp().div_euclid(SECS_PER_HOUR);
    let start_hour = (now - Duration::days(30 * config.backtest_months as i64))
        .timestamp()
        .div_euclid(SECS_PER_HOUR);

    // Bucket events by publication hour; hours outside the index are dropped
    let mut bins: HashMap<i64, HourBin> = HashMap::new();
    for article in &relevant {
        let hour = article.published_at.timestamp().div_euclid(SECS_PER_HOUR);
        if hour < start_hour || hour > end_hour {
            continue;
        }
        let bin = bins.entry(hour).or_default();
        bin.article_count += 1;
        bin.sentiment_sum += article.sentiment as i64;
        if article.sentiment == 1 {
            bin.bullish += 1;
        } else if article.sentiment == -1 {
            bin.bearish += 1;
        }
    }

    debug!(
        relevant = relevant.len(),
        hours = end_hour - start_hour + 1,
        occupied_bins = bins.len(),
        "Building sentiment series"
    );

    let window = config.sentiment_window_hours.max(1) as i64;
    let mut rows = Vec::with_capacity((end_hour - start_hour + 1) as usize);

    // Sliding accumulator over the trailing window: add the bin entering at
    // the current hour, drop the bin leaving at hour - window
    let mut acc = HourBin::default();
    for hour in start_hour..=end_hour {
        if let Some(bin) = bins.get(&hour) {
            acc.article_count += bin.article_count;
            acc.sentiment_sum += bin.sentiment_sum;
            acc.bullish += bin.bullish;
            acc.bearish += bin.bearish;
        }
        if let Some(bin) = bins.get(&(hour - window)) {
            acc.article_count -= bin.article_count;
            acc.sentiment_sum -= bin.sentiment_sum;
            acc.bullish -= bin.bullish;
            acc.bearish -= bin.bearish;
        }

        let denom = acc.article_count.max(1) as f64;
        rows.push(SentimentFeatureRow {
            ts: DateTime::from_timestamp(hour * SECS_PER_HOUR, 0)
                .unwrap_or(DateTime::UNIX_EPOCH),
            sentiment_score: acc.sentiment_sum as f64 / denom,
            bullish_ratio: acc.bullish as f64 / denom,
            bearish_ratio: acc.bearish as f64 / denom,
            article_count: acc.article_count as u32,
        });
    }

    info!("Built sentiment series with {} hourly rows", rows.len());

    rows
}
