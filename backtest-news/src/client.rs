//! NewsAPI client
//!
//! Pages through `/v2/everything` for the macro keyword universe over a
//! bounded time range. The page loop stops at the reported result count or
//! at the article cap, whichever comes first.

use crate::error::NewsError;
use crate::types::{build_keyword_query, NewsApiResponse, MACRO_KEYWORDS, NEWSAPI_BASE_URL};
use backtest_core::NewsArticle;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument};

const PAGE_SIZE: u32 = 100;

/// Default cap on articles fetched in one run
pub const DEFAULT_MAX_ARTICLES: usize = 5000;

/// NewsAPI client
#[derive(Clone)]
pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    /// Create a client with an explicit API key
    pub fn new(api_key: impl Into<String>) -> Result<Self, NewsError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(NewsError::MissingCredential(
                "NEWSAPI_API_KEY is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NewsError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: NEWSAPI_BASE_URL.to_string(),
            api_key,
        })
    }

    /// Create a client from the `NEWSAPI_API_KEY` environment variable
    pub fn from_env() -> Result<Self, NewsError> {
        let api_key = std::env::var("NEWSAPI_API_KEY").map_err(|_| {
            NewsError::MissingCredential("NEWSAPI_API_KEY is not set".to_string())
        })?;
        Self::new(api_key)
    }

    /// Point the client at a custom base URL (used in tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch macro news published within `[start, end]`
    ///
    /// Returns articles sorted ascending by publication time, capped at
    /// `max_articles`.
    #[instrument(skip(self))]
    pub async fn fetch_macro_news(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        max_articles: usize,
    ) -> Result<Vec<NewsArticle>, NewsError> {
        let query = build_keyword_query(MACRO_KEYWORDS);
        let mut articles: Vec<NewsArticle> = Vec::new();
        let mut page: u32 = 1;

        loop {
            let response = self.fetch_page(&query, start, end, page).await?;

            let total_results = response.total_results;
            let fetched = response.articles.len();
            articles.extend(response.articles.into_iter().map(|a| a.into_article()));

            debug!(
                page,
                fetched,
                total = articles.len(),
                total_results,
                "Fetched NewsAPI page"
            );

            if articles.len() >= max_articles {
                articles.truncate(max_articles);
                break;
            }

            if page >= total_pages(total_results) || fetched == 0 {
                break;
            }
            page += 1;
        }

        articles.sort_by_key(|a| a.published_at);

        info!("Fetched {} macro news articles", articles.len());

        Ok(articles)
    }

    async fn fetch_page(
        &self,
        query: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page: u32,
    ) -> Result<NewsApiResponse, NewsError> {
        let url = format!(
            "{}?q={}&from={}&to={}&language=en&sortBy=publishedAt&pageSize={}&page={}&apiKey={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&start.to_rfc3339()),
            urlencoding::encode(&end.to_rfc3339()),
            PAGE_SIZE,
            page,
            self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| NewsError::RequestFailed(format!("NewsAPI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(NewsError::ApiError { status, message });
        }

        response
            .json::<NewsApiResponse>()
            .await
            .map_err(|e| NewsError::ParseError(format!("Failed to parse NewsAPI response: {}", e)))
    }
}

/// Number of pages NewsAPI will serve for a reported result count
fn total_pages(total_results: u32) -> u32 {
    total_results.div_ceil(PAGE_SIZE)
}
