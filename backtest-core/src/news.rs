//! News articles and sentiment labels

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw news article as fetched from the news provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub source_name: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    pub published_at: DateTime<Utc>,
}

/// Model-assigned label for a single article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleLabel {
    /// Coarse topic bucket, e.g. "Fed_rate", "inflation", "jobs", "other"
    pub topic: String,

    /// 1 if the article is relevant to macro markets, else 0
    pub relevance: i32,

    /// -1 bearish, 0 neutral, 1 bullish
    pub sentiment: i32,
}

impl ArticleLabel {
    /// Label applied when classification fails for any reason
    pub fn neutral() -> Self {
        Self {
            topic: "other".to_string(),
            relevance: 0,
            sentiment: 0,
        }
    }
}

/// An article joined with its label, the unit of input to the feature builder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledArticle {
    /// Sequential ID assigned at ingestion (1-based)
    pub id: i64,
    pub source: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub topic: String,
    pub relevance: i32,
    pub sentiment: i32,
}

impl LabeledArticle {
    pub fn new(id: i64, article: &NewsArticle, label: ArticleLabel) -> Self {
        Self {
            id,
            source: article.source_name.clone(),
            title: article.title.clone(),
            description: article.description.clone(),
            content: article.content.clone(),
            url: article.url.clone(),
            published_at: article.published_at,
            topic: label.topic,
            relevance: label.relevance,
            sentiment: label.sentiment,
        }
    }
}
