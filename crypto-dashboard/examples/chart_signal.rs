use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use common::GeminiClient;
use crypto_dashboard::{render, ChartImage, CoinGeckoClient, Dashboard, DashboardConfig, Timeframe};
use dotenv::dotenv;

const USAGE: &str = "usage: chart_signal <TOKEN> <15m.png> <1h.png>";

async fn load(timeframe: Timeframe, path: &str) -> Result<ChartImage> {
    let path = Path::new(path);
    let mime_type = ChartImage::mime_type_for(path)?;
    let bytes = tokio::fs::read(path).await?;
    Ok(ChartImage::new(timeframe, mime_type, bytes)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    let mut args = std::env::args().skip(1);
    let token = args.next().unwrap_or_else(|| "SOL".to_string());
    let chart_15m = args.next().context(USAGE)?;
    let chart_1h = args.next().context(USAGE)?;

    println!("🔄 Initializing Analysis...");

    let config = DashboardConfig::default();
    let market = CoinGeckoClient::from_config(&config)?;
    let dashboard = Dashboard::new(config, Arc::new(GeminiClient::from_env()?), market);

    let chart_15m = load(Timeframe::M15, &chart_15m).await?;
    let chart_1h = load(Timeframe::H1, &chart_1h).await?;

    let result = dashboard
        .analyze(&token, Some(chart_15m), Some(chart_1h))
        .await?;
    render::print_analysis(&token, &result);

    Ok(())
}
