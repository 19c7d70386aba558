use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::gemini::{GenerateContentRequest, Part, Schema};
use common::{with_retry, AgentError, GenerativeModel, RetryConfig};
use serde::Deserialize;
use tracing::{info, warn};

use super::parse_model_json;
use crate::models::{AnalysisResult, ChartImage, Confidence, TradeDirection};

fn analysis_prompt(token: &str) -> String {
    format!(
        r#"
You are an expert crypto analyst. Analyze these two chart screenshots for {token}.
Image 1: 15m timeframe. Image 2: 1h timeframe.

Focus: MACD (12, 26, 9) "Second Half Red Zone" (receding red histogram bars).
Rule: Recommend Long if the 1h trend confirms, or if the 15m shows bullish momentum receding from red.

Return valid JSON only.
"#
    )
}

fn analysis_schema() -> Schema {
    Schema::object(vec![
        ("trend", Schema::string()),
        ("direction", Schema::string_enum(&["Long", "Short", "Wait"])),
        ("entryPrice", Schema::string()),
        ("targetPrice", Schema::string()),
        ("pnlProjection", Schema::string()),
        ("rationale", Schema::string()),
        ("confidence", Schema::string_enum(&["High", "Medium", "Low"])),
    ])
}

/// Analysis as the model returns it, before enum mapping.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelAnalysis {
    trend: String,
    #[serde(default)]
    direction: Option<String>,
    entry_price: String,
    target_price: String,
    pnl_projection: String,
    rationale: String,
    confidence: String,
}

impl From<ModelAnalysis> for AnalysisResult {
    fn from(raw: ModelAnalysis) -> Self {
        Self {
            direction: TradeDirection::from_model(raw.direction.as_deref()),
            confidence: Confidence::from_model(&raw.confidence),
            trend: raw.trend,
            entry_price: raw.entry_price,
            target_price: raw.target_price,
            pnl_projection: raw.pnl_projection,
            rationale: raw.rationale,
        }
    }
}

/// Allows one analysis at a time; a second caller is turned away, not queued.
#[derive(Debug, Default)]
pub struct AnalysisGate {
    busy: Arc<AtomicBool>,
}

impl AnalysisGate {
    pub fn try_acquire(&self) -> Option<AnalysisPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| AnalysisPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the gate on drop.
#[derive(Debug)]
pub struct AnalysisPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for AnalysisPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

pub struct ChartAnalyst {
    model: Arc<dyn GenerativeModel>,
    retry: RetryConfig,
    gate: AnalysisGate,
}

impl ChartAnalyst {
    pub fn new(model: Arc<dyn GenerativeModel>, retry: RetryConfig) -> Self {
        Self {
            model,
            retry,
            gate: AnalysisGate::default(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Ask the model for a trade signal from a 15m and a 1h chart of `token`.
    ///
    /// Both charts are checked before anything is sent; a missing chart is
    /// rejected locally.
    pub async fn analyze(
        &self,
        token: &str,
        chart_15m: Option<ChartImage>,
        chart_1h: Option<ChartImage>,
    ) -> Result<AnalysisResult, AgentError> {
        let (chart_15m, chart_1h) = match (chart_15m, chart_1h) {
            (Some(m15), Some(h1)) => (m15, h1),
            _ => return Err(AgentError::MissingCharts),
        };

        let token = token.trim().to_uppercase();
        if token.is_empty() {
            return Err(AgentError::InvalidInput("token symbol is required".to_string()));
        }

        let _permit = self.gate.try_acquire().ok_or(AgentError::Busy)?;

        info!(%token, model = self.model.model(), "Analyzing charts");
        let request = GenerateContentRequest::user(vec![
            encode_chart(&chart_15m),
            encode_chart(&chart_1h),
            Part::text(analysis_prompt(&token)),
        ])
        .with_json_schema(analysis_schema());

        let response = with_retry(&self.retry, "analyze_charts", || {
            self.model.generate_content(&request)
        })
        .await
        .inspect_err(|e| warn!(%token, error = %e, "Chart analysis failed"))?;

        let raw: ModelAnalysis = parse_model_json(&response)?;
        let result = AnalysisResult::from(raw);
        info!(
            %token,
            direction = %result.direction,
            confidence = %result.confidence,
            "Signal ready"
        );

        Ok(result)
    }
}

fn encode_chart(chart: &ChartImage) -> Part {
    Part::inline_data(chart.mime_type.clone(), STANDARD.encode(&chart.bytes))
}
