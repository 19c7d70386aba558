use std::time::Duration;

use common::{AgentError, RetryConfig};
use crypto_dashboard::{
    ChartImage, Dashboard, DashboardConfig, MarketTrend, Sentiment, SentimentAnalysis, Timeframe,
    TradeDirection,
};
use httpmock::prelude::*;
use serde_json::json;

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

fn config(gemini: &MockServer, coingecko: &MockServer) -> DashboardConfig {
    DashboardConfig {
        gemini_base_url: Some(gemini.base_url()),
        coingecko_base_url: Some(coingecko.base_url()),
        retry: RetryConfig {
            max_retries: 3,
            initial_delay: Duration::from_millis(10),
            multiplier: 2,
        },
        ..DashboardConfig::default()
    }
}

fn chart(timeframe: Timeframe) -> ChartImage {
    ChartImage::new(timeframe, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0]).unwrap()
}

fn model_text(text: &str) -> serde_json::Value {
    json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})
}

#[tokio::test]
async fn pollers_publish_market_and_sentiment_on_activation() {
    let gemini = MockServer::start_async().await;
    let coingecko = MockServer::start_async().await;

    coingecko
        .mock_async(|when, then| {
            when.method(GET).path("/coins/markets");
            then.status(200).json_body(json!([
                {"id": "bitcoin", "symbol": "BTC", "name": "Bitcoin", "current_price": 97000.0,
                 "price_change_percentage_24h": -0.8, "market_cap": 1.9e12, "image": "btc.png"},
                {"id": "usd-coin", "symbol": "USDC", "name": "USDC", "current_price": 1.0,
                 "price_change_percentage_24h": 0.0, "market_cap": 6.0e10, "image": "usdc.png"},
                {"id": "ethereum", "symbol": "ETH", "name": "Ethereum", "current_price": 3400.0,
                 "price_change_percentage_24h": -1.1, "market_cap": 4.1e11, "image": "eth.png"},
                {"id": "sui", "symbol": "SUI", "name": "Sui", "current_price": 4.2,
                 "price_change_percentage_24h": 6.3, "market_cap": 1.3e10, "image": "sui.png"}
            ]));
        })
        .await;

    gemini
        .mock_async(|when, then| {
            when.method(POST)
                .path(GENERATE_PATH)
                .header("x-goog-api-key", "test-key")
                .body_contains("googleSearch");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "{\"sentiment\":\"Neutral\",\"summary\":\"Chop before CPI.\"}"}]},
                    "groundingMetadata": {"groundingChunks": [
                        {"web": {"uri": "https://example.com/cpi", "title": "CPI preview"}}
                    ]}
                }]
            }));
        })
        .await;

    let dashboard = Dashboard::connect(config(&gemini, &coingecko), "test-key").unwrap();
    let session = dashboard.activate();

    let mut market_rx = session.subscribe_market();
    let mut sentiment_rx = session.subscribe_sentiment();

    tokio::time::timeout(Duration::from_secs(10), market_rx.wait_for(Option::is_some))
        .await
        .expect("market poller did not publish")
        .unwrap();
    tokio::time::timeout(Duration::from_secs(10), sentiment_rx.wait_for(Option::is_some))
        .await
        .expect("sentiment poller did not publish")
        .unwrap();

    let market = session.market().unwrap();
    let symbols: Vec<&str> = market.coins.iter().map(|c| c.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["BTC", "ETH", "SUI"]);
    assert_eq!((market.up_count, market.down_count), (1, 2));
    assert_eq!(market.trend, MarketTrend::Bearish);

    let sentiment = session.sentiment().unwrap();
    assert_eq!(sentiment.sentiment, Sentiment::Neutral);
    assert_eq!(sentiment.summary, "Chop before CPI.");
    assert_eq!(sentiment.sources.len(), 1);
    assert_eq!(sentiment.sources[0].title, "CPI preview");
}

#[tokio::test]
async fn analysis_goes_over_the_wire_with_both_images() {
    let gemini = MockServer::start_async().await;
    let coingecko = MockServer::start_async().await;

    let mock = gemini
        .mock_async(|when, then| {
            when.method(POST)
                .path(GENERATE_PATH)
                .body_contains("\"mimeType\":\"image/jpeg\"")
                .body_contains("\"responseMimeType\":\"application/json\"");
            then.status(200).json_body(model_text(
                r#"{"trend":"Breakdown","direction":"Short","entryPrice":"180","targetPrice":"165",
                    "pnlProjection":"+8.3%","rationale":"1h MACD below zero","confidence":"Low"}"#,
            ));
        })
        .await;

    let dashboard = Dashboard::connect(config(&gemini, &coingecko), "test-key").unwrap();
    let result = dashboard
        .analyze("sol", Some(chart(Timeframe::M15)), Some(chart(Timeframe::H1)))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.direction, TradeDirection::Short);
    assert_eq!(result.entry_price, "180");
    assert!(!dashboard.is_analyzing());
}

#[tokio::test]
async fn missing_chart_never_reaches_the_model() {
    let gemini = MockServer::start_async().await;
    let coingecko = MockServer::start_async().await;

    let mock = gemini
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(model_text("{}"));
        })
        .await;

    let dashboard = Dashboard::connect(config(&gemini, &coingecko), "test-key").unwrap();
    let err = dashboard
        .analyze("SOL", None, Some(chart(Timeframe::H1)))
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::MissingCharts));
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn persistent_rate_limit_exhausts_budget_then_degrades() {
    let gemini = MockServer::start_async().await;
    let coingecko = MockServer::start_async().await;

    let mock = gemini
        .mock_async(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(429).json_body(json!({
                "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
            }));
        })
        .await;

    let dashboard = Dashboard::connect(config(&gemini, &coingecko), "test-key").unwrap();

    assert_eq!(dashboard.sentiment().await, SentimentAnalysis::unavailable());
    assert_eq!(mock.hits_async().await, 4);

    let err = dashboard
        .analyze("SUI", Some(chart(Timeframe::M15)), Some(chart(Timeframe::H1)))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Quota exceeded"));
    assert_eq!(mock.hits_async().await, 8);
}

#[tokio::test]
async fn market_outage_renders_as_no_data() {
    let gemini = MockServer::start_async().await;
    let coingecko = MockServer::start_async().await;

    coingecko
        .mock_async(|when, then| {
            when.method(GET).path("/coins/markets");
            then.status(503);
        })
        .await;

    let dashboard = Dashboard::connect(config(&gemini, &coingecko), "test-key").unwrap();
    let snapshot = dashboard.market_snapshot().await;

    assert!(snapshot.is_empty());
    assert_eq!((snapshot.up_count, snapshot.down_count), (0, 0));
}
