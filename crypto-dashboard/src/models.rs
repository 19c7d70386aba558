use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use common::AgentError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeDirection {
    Long,
    Short,
    Wait,
}

impl TradeDirection {
    /// Map the model's `Long` / `Short` / `Wait` value; anything else waits.
    pub fn from_model(value: Option<&str>) -> Self {
        match value {
            Some("Long") => TradeDirection::Long,
            Some("Short") => TradeDirection::Short,
            _ => TradeDirection::Wait,
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Long => write!(f, "LONG"),
            TradeDirection::Short => write!(f, "SHORT"),
            TradeDirection::Wait => write!(f, "WAIT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_model(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "HIGH"),
            Confidence::Medium => write!(f, "MEDIUM"),
            Confidence::Low => write!(f, "LOW"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub trend: String,
    pub direction: TradeDirection,
    pub entry_price: String,
    pub target_price: String,
    pub pnl_projection: String,
    pub rationale: String,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl Sentiment {
    pub fn from_model(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "bullish" => Sentiment::Bullish,
            "bearish" => Sentiment::Bearish,
            _ => Sentiment::Neutral,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Bullish => write!(f, "BULLISH"),
            Sentiment::Bearish => write!(f, "BEARISH"),
            Sentiment::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub sentiment: Sentiment,
    pub summary: String,
    pub sources: Vec<Source>,
}

impl SentimentAnalysis {
    pub const UNAVAILABLE_SUMMARY: &'static str = "Error fetching sentiment data.";

    /// Shown in place of a failed refresh.
    pub fn unavailable() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            summary: Self::UNAVAILABLE_SUMMARY.to_string(),
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
}

impl MarketCoin {
    pub fn is_up(&self) -> bool {
        self.price_change_percentage_24h.unwrap_or_default() > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketTrend {
    Bullish,
    Bearish,
}

impl MarketTrend {
    /// Ties count as bullish.
    pub fn from_counts(up: usize, down: usize) -> Self {
        if up >= down {
            MarketTrend::Bullish
        } else {
            MarketTrend::Bearish
        }
    }
}

impl fmt::Display for MarketTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketTrend::Bullish => write!(f, "Bullish"),
            MarketTrend::Bearish => write!(f, "Bearish"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub coins: Vec<MarketCoin>,
    pub up_count: usize,
    pub down_count: usize,
    pub trend: MarketTrend,
    pub updated_at: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Build from already filtered coins, keeping their order.
    pub fn from_coins(coins: Vec<MarketCoin>) -> Self {
        let up_count = coins.iter().filter(|c| c.is_up()).count();
        let down_count = coins.len() - up_count;

        Self {
            trend: MarketTrend::from_counts(up_count, down_count),
            coins,
            up_count,
            down_count,
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeframe::M15 => write!(f, "15m"),
            Timeframe::H1 => write!(f, "1h"),
        }
    }
}

/// A chart screenshot for one timeframe.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub timeframe: Timeframe,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ChartImage {
    pub fn new(timeframe: Timeframe, mime_type: &str, bytes: Vec<u8>) -> Result<Self, AgentError> {
        if bytes.is_empty() {
            return Err(AgentError::InvalidInput(format!(
                "{timeframe} chart image is empty"
            )));
        }
        if !mime_type.starts_with("image/") {
            return Err(AgentError::InvalidInput(format!(
                "{timeframe} chart must be an image, got {mime_type}"
            )));
        }

        Ok(Self {
            timeframe,
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    /// MIME type of a screenshot, from its file extension.
    pub fn mime_type_for(path: &Path) -> Result<&'static str, AgentError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "png" => Ok("image/png"),
            "jpg" | "jpeg" => Ok("image/jpeg"),
            "webp" => Ok("image/webp"),
            "gif" => Ok("image/gif"),
            _ => Err(AgentError::InvalidInput(format!(
                "{} is not a supported image",
                path.display()
            ))),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("Market data fetch failed: {0}")]
    ApiError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
