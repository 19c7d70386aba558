use std::time::Duration;

use common::{RetryConfig, GEMINI_2_0_FLASH};

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub gemini_model: String,
    /// Overrides the Gemini endpoint, mainly for tests.
    pub gemini_base_url: Option<String>,
    pub coingecko_base_url: Option<String>,

    // Poll periods
    pub market_refresh: Duration,
    pub sentiment_refresh: Duration,

    pub retry: RetryConfig,

    /// Symbols offered by default for chart analysis.
    pub tokens: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            gemini_model: GEMINI_2_0_FLASH.to_string(),
            gemini_base_url: None,
            coingecko_base_url: None,

            market_refresh: Duration::from_secs(300),     // 5 minutes
            sentiment_refresh: Duration::from_secs(3600), // 1 hour

            retry: RetryConfig::default(),

            tokens: vec!["SUI".to_string(), "SOL".to_string(), "BERA".to_string()],
        }
    }
}
