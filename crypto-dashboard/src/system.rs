use std::sync::Arc;

use anyhow::Result;
use common::{AgentError, GeminiClient, GenerativeModel};
use tokio::sync::watch;
use tracing::info;

use crate::agents::{ChartAnalyst, SentimentAgent};
use crate::api::CoinGeckoClient;
use crate::config::DashboardConfig;
use crate::models::{AnalysisResult, ChartImage, MarketSnapshot, SentimentAnalysis};
use crate::poller::ScopedTask;

/// The three flows behind one handle. They share collaborators, never state.
pub struct Dashboard {
    config: DashboardConfig,
    market: CoinGeckoClient,
    chart_analyst: Arc<ChartAnalyst>,
    sentiment_agent: Arc<SentimentAgent>,
}

impl Dashboard {
    pub fn new(
        config: DashboardConfig,
        model: Arc<dyn GenerativeModel>,
        market: CoinGeckoClient,
    ) -> Self {
        Self {
            chart_analyst: Arc::new(ChartAnalyst::new(Arc::clone(&model), config.retry)),
            sentiment_agent: Arc::new(SentimentAgent::new(model, config.retry)),
            market,
            config,
        }
    }

    /// Wire up the real Gemini and CoinGecko clients from `config`.
    pub fn connect(config: DashboardConfig, gemini_api_key: &str) -> Result<Self> {
        let mut gemini = GeminiClient::new(gemini_api_key).with_model(&config.gemini_model);
        if let Some(url) = &config.gemini_base_url {
            gemini = gemini.with_base_url(url);
        }

        let market = CoinGeckoClient::from_config(&config)?;

        Ok(Self::new(config, Arc::new(gemini), market))
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub async fn analyze(
        &self,
        token: &str,
        chart_15m: Option<ChartImage>,
        chart_1h: Option<ChartImage>,
    ) -> Result<AnalysisResult, AgentError> {
        self.chart_analyst.analyze(token, chart_15m, chart_1h).await
    }

    pub fn is_analyzing(&self) -> bool {
        self.chart_analyst.is_busy()
    }

    pub async fn market_snapshot(&self) -> MarketSnapshot {
        self.market.market_snapshot().await
    }

    pub async fn sentiment(&self) -> SentimentAnalysis {
        self.sentiment_agent.fetch().await
    }

    /// Start both pollers. They stop when the returned session is dropped.
    pub fn activate(&self) -> DashboardSession {
        let (market_tx, market_rx) = watch::channel(None);
        let (sentiment_tx, sentiment_rx) = watch::channel(None);

        let market = self.market.clone();
        let market_task = ScopedTask::spawn("market", self.config.market_refresh, move || {
            let market = market.clone();
            let tx = market_tx.clone();
            async move {
                let snapshot = market.market_snapshot().await;
                tx.send_replace(Some(snapshot));
            }
        });

        let agent = Arc::clone(&self.sentiment_agent);
        let sentiment_task =
            ScopedTask::spawn("sentiment", self.config.sentiment_refresh, move || {
                let agent = Arc::clone(&agent);
                let tx = sentiment_tx.clone();
                async move {
                    let analysis = agent.fetch().await;
                    tx.send_replace(Some(analysis));
                }
            });

        info!(
            market_secs = self.config.market_refresh.as_secs(),
            sentiment_secs = self.config.sentiment_refresh.as_secs(),
            "Dashboard pollers started"
        );

        DashboardSession {
            market_rx,
            sentiment_rx,
            _market_task: market_task,
            _sentiment_task: sentiment_task,
        }
    }
}

/// Live view of the polled flows. `None` means the first refresh is still
/// running.
pub struct DashboardSession {
    market_rx: watch::Receiver<Option<MarketSnapshot>>,
    sentiment_rx: watch::Receiver<Option<SentimentAnalysis>>,
    _market_task: ScopedTask,
    _sentiment_task: ScopedTask,
}

impl DashboardSession {
    pub fn market(&self) -> Option<MarketSnapshot> {
        self.market_rx.borrow().clone()
    }

    pub fn sentiment(&self) -> Option<SentimentAnalysis> {
        self.sentiment_rx.borrow().clone()
    }

    pub fn subscribe_market(&self) -> watch::Receiver<Option<MarketSnapshot>> {
        self.market_rx.clone()
    }

    pub fn subscribe_sentiment(&self) -> watch::Receiver<Option<SentimentAnalysis>> {
        self.sentiment_rx.clone()
    }
}
