use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crypto_dashboard::{
    middleware::cors_middleware, render, routes, ChartImage, CoinGeckoClient, Dashboard,
    DashboardConfig, Timeframe,
};
use dotenv::dotenv;
use tracing::info;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Chart signals, market monitor and sentiment feed",
    long_about = None
)]
struct Args {
    /// Gemini API key
    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    gemini_api_key: Option<String>,

    /// Gemini model used for charts and sentiment
    #[clap(long, env = "GEMINI_MODEL", global = true)]
    model: Option<String>,

    /// CoinGecko API base URL
    #[clap(long, env = "COINGECKO_BASE_URL", global = true)]
    coingecko_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a 15m and a 1h chart screenshot
    Analyze {
        /// Token symbol, e.g. SUI, SOL, BERA
        #[clap(long)]
        token: Option<String>,

        #[clap(long = "chart-15m")]
        chart_15m: Option<PathBuf>,

        #[clap(long = "chart-1h")]
        chart_1h: Option<PathBuf>,
    },
    /// Print the top coins once
    Market,
    /// Print the current market sentiment once
    Sentiment,
    /// Keep polling market and sentiment until Ctrl+C
    Watch,
    /// Serve the dashboard JSON API
    Serve {
        #[clap(long, default_value = "127.0.0.1:8080")]
        bind: String,
    },
}

async fn load_chart(timeframe: Timeframe, path: Option<PathBuf>) -> Result<Option<ChartImage>> {
    let Some(path) = path else {
        return Ok(None);
    };

    let mime_type = ChartImage::mime_type_for(&path)?;
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(Some(ChartImage::new(timeframe, mime_type, bytes)?))
}

fn dashboard(args: &Args, config: DashboardConfig) -> Result<Dashboard> {
    let api_key = args
        .gemini_api_key
        .as_deref()
        .context("GEMINI_API_KEY must be set")?;
    Dashboard::connect(config, api_key)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = DashboardConfig::default();
    if let Some(model) = &args.model {
        config.gemini_model = model.clone();
    }
    config.coingecko_base_url = args.coingecko_url.clone();

    match &args.command {
        Command::Analyze {
            token,
            chart_15m,
            chart_1h,
        } => {
            let token = match token {
                Some(token) => token.clone(),
                None => config.tokens.first().cloned().unwrap_or_default(),
            };
            let chart_15m = load_chart(Timeframe::M15, chart_15m.clone()).await?;
            let chart_1h = load_chart(Timeframe::H1, chart_1h.clone()).await?;
            let dashboard = dashboard(&args, config)?;

            println!("🔍 Analyzing {} charts...", token.to_uppercase());
            match dashboard.analyze(&token, chart_15m, chart_1h).await {
                Ok(result) => render::print_analysis(&token, &result),
                Err(e) => println!("⚠️ {e}"),
            }
        }
        Command::Market => {
            let market = CoinGeckoClient::from_config(&config)?;
            render::print_market(&market.market_snapshot().await);
        }
        Command::Sentiment => {
            let dashboard = dashboard(&args, config)?;
            render::print_sentiment(&dashboard.sentiment().await);
        }
        Command::Watch => {
            let dashboard = dashboard(&args, config)?;
            let session = dashboard.activate();
            let mut market_rx = session.subscribe_market();
            let mut sentiment_rx = session.subscribe_sentiment();

            println!("🚀 Watching market and sentiment. Press Ctrl+C to exit");
            loop {
                tokio::select! {
                    Ok(()) = market_rx.changed() => {
                        if let Some(snapshot) = market_rx.borrow_and_update().as_ref() {
                            render::print_market(snapshot);
                        }
                    }
                    Ok(()) = sentiment_rx.changed() => {
                        if let Some(analysis) = sentiment_rx.borrow_and_update().as_ref() {
                            render::print_sentiment(analysis);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        println!("\n👋 Stopping pollers");
                        break;
                    }
                }
            }
        }
        Command::Serve { bind } => {
            let dashboard = Arc::new(dashboard(&args, config)?);
            let state = web::Data::new(routes::AppState::new(dashboard));

            info!(%bind, "Serving dashboard API");
            HttpServer::new(move || {
                App::new()
                    .wrap(cors_middleware())
                    .app_data(state.clone())
                    .configure(routes::config)
            })
            .bind(bind.as_str())
            .with_context(|| format!("Failed to bind {bind}"))?
            .run()
            .await?;
        }
    }

    Ok(())
}
