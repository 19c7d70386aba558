use anyhow::{Context, Result};
use reqwest::Client;
use tokio::time::Duration;
use tracing::{debug, error};

use crate::config::DashboardConfig;
use crate::models::{MarketCoin, MarketError, MarketSnapshot};

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const TOP_COINS: &str = "10";

/// Fiat-pegged symbols left out of the monitor, compared lowercase.
pub const STABLECOINS: &[&str] = &[
    "usdt", "usdc", "dai", "fdusd", "tusd", "pyusd", "usdp", "busd", "usde",
];

pub fn is_stablecoin(symbol: &str) -> bool {
    STABLECOINS.contains(&symbol.to_lowercase().as_str())
}

/// Drop stablecoins, keeping the endpoint's market cap order.
pub fn filter_stablecoins(coins: Vec<MarketCoin>) -> Vec<MarketCoin> {
    coins
        .into_iter()
        .filter(|coin| !is_stablecoin(&coin.symbol))
        .collect()
}

#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent(concat!("crypto-dashboard/", env!("CARGO_PKG_VERSION")))
                .build()?,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Client pointed at `config.coingecko_base_url` when one is set.
    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        let client = Self::new()?;
        Ok(match &config.coingecko_base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Top coins by market cap, failing on transport or status errors.
    pub async fn try_fetch_top_coins(&self) -> Result<Vec<MarketCoin>> {
        let url = format!("{}/coins/markets", self.base_url);
        let params = [
            ("vs_currency", "usd"),
            ("order", "market_cap_desc"),
            ("per_page", TOP_COINS),
            ("page", "1"),
            ("sparkline", "false"),
        ];

        debug!(%url, "Fetching top coins");
        let response = self
            .client
            .get(&url)
            .query(&params)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(MarketError::ApiError(
                status.canonical_reason().unwrap_or(status.as_str()).to_string(),
            )
            .into());
        }

        let text = response
            .text()
            .await
            .context("Failed to get response text")?;

        let coins: Vec<MarketCoin> = serde_json::from_str(&text)
            .map_err(|e| MarketError::InvalidData(e.to_string()))?;

        Ok(coins)
    }

    /// Like [`try_fetch_top_coins`](Self::try_fetch_top_coins) but logs and
    /// returns an empty list on failure.
    pub async fn fetch_top_coins(&self) -> Vec<MarketCoin> {
        match self.try_fetch_top_coins().await {
            Ok(coins) => coins,
            Err(e) => {
                error!(error = %e, "Failed to fetch market data");
                Vec::new()
            }
        }
    }

    pub async fn market_snapshot(&self) -> MarketSnapshot {
        let coins = filter_stablecoins(self.fetch_top_coins().await);
        debug!(coins = coins.len(), "Market snapshot refreshed");
        MarketSnapshot::from_coins(coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MarketTrend;
    use httpmock::prelude::*;
    use serde_json::json;

    fn coin(symbol: &str) -> MarketCoin {
        MarketCoin {
            id: symbol.to_lowercase(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            current_price: Some(1.0),
            price_change_percentage_24h: Some(0.5),
            market_cap: Some(1.0),
            image: None,
        }
    }

    #[test]
    fn stable_filter_is_case_insensitive_and_keeps_order() {
        let coins = vec![coin("USDT"), coin("sol"), coin("Usdc"), coin("bera")];
        let symbols: Vec<String> = filter_stablecoins(coins)
            .into_iter()
            .map(|c| c.symbol)
            .collect();

        assert_eq!(symbols, vec!["sol", "bera"]);
    }

    #[tokio::test]
    async fn fetches_top_ten_by_market_cap() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/coins/markets")
                    .query_param("vs_currency", "usd")
                    .query_param("order", "market_cap_desc")
                    .query_param("per_page", "10")
                    .query_param("page", "1")
                    .query_param("sparkline", "false");
                then.status(200).json_body(json!([
                    {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "current_price": 97000.0,
                     "price_change_percentage_24h": 1.5, "market_cap": 1.9e12, "image": "btc.png"},
                    {"id": "tether", "symbol": "usdt", "name": "Tether", "current_price": 1.0,
                     "price_change_percentage_24h": 0.01, "market_cap": 1.4e11, "image": "usdt.png"},
                    {"id": "solana", "symbol": "sol", "name": "Solana", "current_price": 180.0,
                     "price_change_percentage_24h": -2.0, "market_cap": 8.0e10, "image": "sol.png"}
                ]));
            })
            .await;

        let config = DashboardConfig {
            coingecko_base_url: Some(server.base_url()),
            ..DashboardConfig::default()
        };
        let client = CoinGeckoClient::from_config(&config).unwrap();
        let snapshot = client.market_snapshot().await;

        mock.assert_async().await;
        let ids: Vec<&str> = snapshot.coins.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["bitcoin", "solana"]);
        assert_eq!((snapshot.up_count, snapshot.down_count), (1, 1));
        assert_eq!(snapshot.trend, MarketTrend::Bullish);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error_but_fetch_is_fail_soft() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/coins/markets");
                then.status(429).body("Throttled");
            })
            .await;

        let client = CoinGeckoClient::new().unwrap().with_base_url(&server.base_url());

        let err = client.try_fetch_top_coins().await.unwrap_err();
        assert!(err.to_string().contains("Too Many Requests"));

        assert!(client.fetch_top_coins().await.is_empty());
        assert!(client.market_snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_fail_soft() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/coins/markets");
                then.status(200).body("{\"error\":\"nope\"}");
            })
            .await;

        let client = CoinGeckoClient::new().unwrap().with_base_url(&server.base_url());
        assert!(client.fetch_top_coins().await.is_empty());
    }
}
