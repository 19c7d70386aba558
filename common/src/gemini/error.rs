use crate::retry::RateLimited;

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("Rate limit exceeded (429): {0}")]
    RateLimit(String),

    #[error("Gemini API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
}

impl RateLimited for GeminiError {
    fn is_rate_limited(&self) -> bool {
        match self {
            GeminiError::RateLimit(_) => true,
            GeminiError::ApiError { status, .. } => *status == 429,
            GeminiError::ReqwestError(e) => {
                e.status().map(|s| s.as_u16() == 429).unwrap_or(false)
                    || e.to_string().contains("429")
            }
            GeminiError::InvalidResponse(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_429_signals_rate_limit() {
        assert!(GeminiError::RateLimit("quota".into()).is_rate_limited());
        assert!(GeminiError::ApiError {
            status: 429,
            message: "RESOURCE_EXHAUSTED".into()
        }
        .is_rate_limited());
        assert!(!GeminiError::ApiError {
            status: 500,
            message: "internal".into()
        }
        .is_rate_limited());
        assert!(!GeminiError::InvalidResponse("no candidates".into()).is_rate_limited());
    }
}
