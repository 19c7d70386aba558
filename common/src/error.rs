use thiserror::Error;

use crate::gemini::GeminiError;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Please upload screenshots for both 15m and 1h timeframes.")]
    MissingCharts,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("An analysis is already in progress")]
    Busy,

    #[error(transparent)]
    AIError(#[from] GeminiError),

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}
