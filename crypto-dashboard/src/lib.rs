pub mod agents;
pub mod api;
pub mod config;
pub mod middleware;
pub mod models;
pub mod poller;
pub mod render;
pub mod routes;
pub mod system;

// Re-export main components
pub use agents::{AnalysisGate, ChartAnalyst, SentimentAgent};
pub use api::CoinGeckoClient;
pub use config::DashboardConfig;
pub use models::{
    AnalysisResult, ChartImage, Confidence, MarketCoin, MarketSnapshot, MarketTrend, Sentiment,
    SentimentAnalysis, Source, Timeframe, TradeDirection,
};
pub use poller::ScopedTask;
pub use system::{Dashboard, DashboardSession};
