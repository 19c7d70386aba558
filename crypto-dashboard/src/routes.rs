use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpResponse};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::AgentError;
use serde::Deserialize;
use tokio::sync::watch;
use tracing::warn;

use crate::models::{ChartImage, MarketSnapshot, SentimentAnalysis, Timeframe};
use crate::system::{Dashboard, DashboardSession};

/// Base64 inflates screenshots by a third; leave room for two of them.
const MAX_JSON_BYTES: usize = 16 * 1024 * 1024;

pub struct AppState {
    dashboard: Arc<Dashboard>,
    market: watch::Receiver<Option<MarketSnapshot>>,
    sentiment: watch::Receiver<Option<SentimentAnalysis>>,
    _session: Option<DashboardSession>,
}

impl AppState {
    /// Starts the pollers; they live as long as the state.
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        let session = dashboard.activate();
        Self {
            market: session.subscribe_market(),
            sentiment: session.subscribe_sentiment(),
            dashboard,
            _session: Some(session),
        }
    }

    #[cfg(test)]
    fn fixed(
        dashboard: Arc<Dashboard>,
        market: Option<MarketSnapshot>,
        sentiment: Option<SentimentAnalysis>,
    ) -> Self {
        Self {
            dashboard,
            market: watch::channel(market).1,
            sentiment: watch::channel(sentiment).1,
            _session: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EncodedChart {
    pub mime_type: String,
    /// Base64, no data-URL prefix.
    pub data: String,
}

impl EncodedChart {
    fn decode(self, timeframe: Timeframe) -> Result<ChartImage, AgentError> {
        let bytes = STANDARD.decode(self.data.trim()).map_err(|e| {
            AgentError::InvalidInput(format!("{timeframe} chart is not valid base64: {e}"))
        })?;
        ChartImage::new(timeframe, &self.mime_type, bytes)
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub token: String,
    #[serde(default)]
    pub chart_15m: Option<EncodedChart>,
    #[serde(default)]
    pub chart_1h: Option<EncodedChart>,
}

fn decode_charts(
    chart_15m: Option<EncodedChart>,
    chart_1h: Option<EncodedChart>,
) -> Result<(Option<ChartImage>, Option<ChartImage>), AgentError> {
    let chart_15m = chart_15m.map(|c| c.decode(Timeframe::M15)).transpose()?;
    let chart_1h = chart_1h.map(|c| c.decode(Timeframe::H1)).transpose()?;
    Ok((chart_15m, chart_1h))
}

fn error_status(error: &AgentError) -> StatusCode {
    match error {
        AgentError::MissingCharts | AgentError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AgentError::Busy => StatusCode::CONFLICT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(error: &AgentError) -> HttpResponse {
    HttpResponse::build(error_status(error)).json(serde_json::json!({
        "error": error.to_string()
    }))
}

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[get("/market")]
pub async fn get_market(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.market.borrow().clone();
    HttpResponse::Ok().json(snapshot)
}

#[get("/sentiment")]
pub async fn get_sentiment(state: web::Data<AppState>) -> HttpResponse {
    let analysis = state.sentiment.borrow().clone();
    HttpResponse::Ok().json(analysis)
}

#[post("/analyze")]
pub async fn analyze(
    state: web::Data<AppState>,
    body: web::Json<AnalyzeRequest>,
) -> HttpResponse {
    let AnalyzeRequest {
        token,
        chart_15m,
        chart_1h,
    } = body.into_inner();

    let (chart_15m, chart_1h) = match decode_charts(chart_15m, chart_1h) {
        Ok(charts) => charts,
        Err(e) => return error_response(&e),
    };

    match state.dashboard.analyze(&token, chart_15m, chart_1h).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => {
            warn!(%token, error = %e, "Analyze request failed");
            error_response(&e)
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(MAX_JSON_BYTES))
        .service(health_check)
        .service(get_market)
        .service(get_sentiment)
        .service(analyze);
}
