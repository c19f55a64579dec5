//! News ingestion and sentiment labeling
//!
//! Two collaborators live here: [`NewsApiClient`] pulls macro-economy
//! headlines from NewsAPI, and [`SentimentLabeler`] assigns each article a
//! topic/relevance/sentiment label via an OpenAI chat completion. Labeling
//! failures degrade to a neutral label per article and never abort a run.

pub mod client;
pub mod error;
pub mod labeler;
pub mod types;

pub use client::{NewsApiClient, DEFAULT_MAX_ARTICLES};
pub use error::NewsError;
pub use labeler::SentimentLabeler;
pub use types::{build_keyword_query, MACRO_KEYWORDS, NEWSAPI_BASE_URL};
