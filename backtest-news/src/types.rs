//! Wire types and query building for NewsAPI

use backtest_core::NewsArticle;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Base URL for the NewsAPI `everything` endpoint
pub const NEWSAPI_BASE_URL: &str = "https://newsapi.org/v2/everything";

/// Keywords that define the macro news universe
pub const MACRO_KEYWORDS: &[&str] = &[
    "Federal Reserve",
    "Fed",
    "FOMC",
    "interest rate",
    "CPI",
    "inflation",
    "PCE",
    "unemployment",
    "non-farm payrolls",
    "jobs report",
];

/// Build the NewsAPI query string: each keyword quoted, joined with OR
pub fn build_keyword_query(keywords: &[&str]) -> String {
    keywords
        .iter()
        .map(|kw| format!("\"{}\"", kw))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Response from GET /v2/everything
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiResponse {
    pub status: String,

    #[serde(default)]
    pub total_results: u32,

    #[serde(default)]
    pub articles: Vec<NewsApiArticle>,
}

/// A single article as NewsAPI returns it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiArticle {
    #[serde(default)]
    pub source: Option<NewsApiSource>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsApiSource {
    #[serde(default)]
    pub name: Option<String>,
}

impl NewsApiArticle {
    /// Convert to the core article type. Articles without a title are kept
    /// with an empty title; the labeler handles them like any other.
    pub fn into_article(self) -> NewsArticle {
        NewsArticle {
            title: self.title.unwrap_or_default(),
            description: self.description,
            content: self.content,
            source_name: self.source.and_then(|s| s.name),
            url: self.url,
            published_at: self.published_at,
        }
    }
}
