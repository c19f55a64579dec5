//! LLM sentiment labeling for news articles
//!
//! Each article is classified independently with a chat completion. Any
//! per-article failure (API error, empty response, unparseable JSON) falls
//! back to the neutral label so one bad article cannot abort the pipeline.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use backtest_core::{ArticleLabel, LabeledArticle, NewsArticle};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::error::NewsError;

const LABEL_MODEL: &str = "gpt-4.1-mini";
const MAX_CONTENT_CHARS: usize = 2000;

const SYSTEM_PROMPT: &str = "You are a macro and Federal Reserve policy analyst. \
Given the following news article title, description, and content, \
determine whether it discusses Fed policy, interest rates, inflation, jobs, or is unrelated. \
Respond with a strict JSON object containing keys: \
topic (Fed_rate | inflation | jobs | other), \
relevance (1 if clearly about Fed/macro policy/inflation/jobs, else 0), \
sentiment (-1 bearish/hawkish, 0 neutral, 1 bullish/dovish for risk assets).";

/// Raw label shape the model is asked to emit
#[derive(Debug, Deserialize)]
struct RawLabel {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    relevance: Option<i32>,
    #[serde(default)]
    sentiment: Option<i32>,
}

/// Sentiment labeler backed by the OpenAI chat API
#[derive(Debug, Clone)]
pub struct SentimentLabeler {
    client: Client<OpenAIConfig>,
    model: String,
}

impl SentimentLabeler {
    /// Create a labeler; requires `OPENAI_API_KEY` in the environment
    pub fn new() -> Result<Self, NewsError> {
        if std::env::var("OPENAI_API_KEY").is_err() {
            return Err(NewsError::MissingCredential(
                "OPENAI_API_KEY is not set".to_string(),
            ));
        }

        // async-openai reads OPENAI_API_KEY from env automatically
        let config = OpenAIConfig::default();
        let client = Client::with_config(config);

        Ok(Self {
            client,
            model: LABEL_MODEL.to_string(),
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Label a batch of articles, preserving input order
    #[instrument(skip(self, articles))]
    pub async fn label_articles(&self, articles: &[NewsArticle]) -> Vec<LabeledArticle> {
        let mut labeled = Vec::with_capacity(articles.len());

        for (i, article) in articles.iter().enumerate() {
            let label = self.label_one(article).await;
            if (i + 1) % 100 == 0 {
                info!("Labeled {}/{} articles", i + 1, articles.len());
            }
            labeled.push(LabeledArticle::new((i + 1) as i64, article, label));
        }

        labeled
    }

    /// Label a single article, falling back to neutral on any failure
    async fn label_one(&self, article: &NewsArticle) -> ArticleLabel {
        match self.classify(article).await {
            Ok(label) => label,
            Err(e) => {
                warn!("Labeling failed, using neutral label: {}", e);
                ArticleLabel::neutral()
            }
        }
    }

    async fn classify(&self, article: &NewsArticle) -> Result<ArticleLabel, NewsError> {
        let content: String = article
            .content
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(MAX_CONTENT_CHARS)
            .collect();

        let user_prompt = format!(
            "Title: {}\nDescription: {}\nContent: {}",
            article.title,
            article.description.as_deref().unwrap_or(""),
            content
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()
                    .map_err(|e| NewsError::InvalidConfig(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt)
                    .build()
                    .map_err(|e| NewsError::InvalidConfig(e.to_string()))?
                    .into(),
            ])
            .temperature(0.0)
            .build()
            .map_err(|e| NewsError::InvalidConfig(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| NewsError::RequestFailed(format!("OpenAI API error: {}", e)))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| NewsError::ParseError("No response from OpenAI".to_string()))?;

        debug!("Label response: {}", text);

        Ok(parse_label(text))
    }
}

/// Parse a label from model output, tolerating markdown fences
///
/// Anything unparseable collapses to the neutral label.
fn parse_label(content: &str) -> ArticleLabel {
    let json_str = match extract_json(content) {
        Some(s) => s,
        None => return ArticleLabel::neutral(),
    };

    match serde_json::from_str::<RawLabel>(&json_str) {
        Ok(raw) => ArticleLabel {
            topic: raw.topic.unwrap_or_else(|| "other".to_string()),
            relevance: raw.relevance.unwrap_or(0),
            sentiment: raw.sentiment.unwrap_or(0),
        },
        Err(_) => ArticleLabel::neutral(),
    }
}

/// Extract JSON from a string that might contain markdown code blocks
fn extract_json(content: &str) -> Option<String> {
    // Try to find JSON in code blocks first
    if let Some(start) = content.find("```json") {
        let start = start + 7;
        if let Some(end) = content[start..].find("```") {
            return Some(content[start..start + end].trim().to_string());
        }
    }

    // Try to find raw JSON
    if let Some(start) = content.find('{') {
        if let Some(end) = content.rfind('}') {
            return Some(content[start..=end].to_string());
        }
    }

    None
}
