use std::sync::Arc;

use common::gemini::{GenerateContentRequest, GenerateContentResponse, Part, Schema};
use common::{with_retry, AgentError, GenerativeModel, RetryConfig};
use serde::Deserialize;
use tracing::{error, info};

use super::parse_model_json;
use crate::models::{Sentiment, SentimentAnalysis, Source};

const SENTIMENT_PROMPT: &str = "Analyze current crypto market sentiment (Thuan Capital, CMC, CoinGecko). \
Determine if Bullish, Bearish, or Neutral.";

pub const MAX_SOURCES: usize = 5;

#[derive(Debug, Deserialize)]
struct ModelSentiment {
    sentiment: String,
    summary: String,
}

/// Search-grounded market mood, refreshed on a timer.
pub struct SentimentAgent {
    model: Arc<dyn GenerativeModel>,
    retry: RetryConfig,
}

impl SentimentAgent {
    pub fn new(model: Arc<dyn GenerativeModel>, retry: RetryConfig) -> Self {
        Self { model, retry }
    }

    pub async fn try_fetch(&self) -> Result<SentimentAnalysis, AgentError> {
        let request = GenerateContentRequest::user(vec![Part::text(SENTIMENT_PROMPT)])
            .with_google_search()
            .with_json_schema(Schema::object(vec![
                ("sentiment", Schema::string_enum(&["Bullish", "Bearish", "Neutral"])),
                ("summary", Schema::string()),
            ]));

        let response = with_retry(&self.retry, "market_sentiment", || {
            self.model.generate_content(&request)
        })
        .await?;

        let raw: ModelSentiment = parse_model_json(&response)?;
        let sources = grounded_sources(&response);
        info!(sentiment = %raw.sentiment, sources = sources.len(), "Sentiment refreshed");

        Ok(SentimentAnalysis {
            sentiment: Sentiment::from_model(&raw.sentiment),
            summary: raw.summary,
            sources,
        })
    }

    /// Never fails: errors are logged and replaced by
    /// [`SentimentAnalysis::unavailable`].
    pub async fn fetch(&self) -> SentimentAnalysis {
        match self.try_fetch().await {
            Ok(analysis) => analysis,
            Err(e) => {
                error!(error = %e, "Failed to fetch market sentiment");
                SentimentAnalysis::unavailable()
            }
        }
    }
}

/// Web citations from the grounding metadata, at most [`MAX_SOURCES`].
fn grounded_sources(response: &GenerateContentResponse) -> Vec<Source> {
    let Some(metadata) = response.grounding_metadata() else {
        return Vec::new();
    };

    metadata
        .grounding_chunks
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .filter_map(|web| {
            let uri = web.uri.clone()?;
            Some(Source {
                title: web.title.clone().unwrap_or_else(|| uri.clone()),
                uri,
            })
        })
        .take(MAX_SOURCES)
        .collect()
}
