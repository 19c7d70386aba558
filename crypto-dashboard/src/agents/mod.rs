use common::gemini::GenerateContentResponse;
use common::AgentError;
use serde::de::DeserializeOwned;

pub mod chart;
pub mod sentiment;

pub use chart::{AnalysisGate, AnalysisPermit, ChartAnalyst};
pub use sentiment::SentimentAgent;

/// Decode the JSON text of the first candidate into `T`.
///
/// Schema-constrained output is normally bare JSON, but a fenced
/// ```` ```json ```` block is tolerated.
pub(crate) fn parse_model_json<T: DeserializeOwned>(
    response: &GenerateContentResponse,
) -> Result<T, AgentError> {
    let text = response
        .text()
        .ok_or_else(|| AgentError::ParseError("model returned no text".to_string()))?;

    let body = strip_code_fence(&text);
    serde_json::from_str(body).map_err(|e| AgentError::ParseError(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
