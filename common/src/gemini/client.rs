use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use tracing::debug;

use super::error::GeminiError;
use super::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

pub const GEMINI_2_0_FLASH: &str = "gemini-2.0-flash";

const API_URL: &str = "https://generativelanguage.googleapis.com";

/// Anything that can answer a `generateContent` request.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Get the model name
    fn model(&self) -> &str;

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    pub base_url: String,
    api_key: String,
    model: String,
    http_client: HttpClient,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            base_url: API_URL.to_string(),
            api_key: api_key.to_string(),
            model: GEMINI_2_0_FLASH.to_string(),
            http_client: HttpClient::new(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?;
        Ok(Self::new(&api_key))
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!(
            model = %self.model,
            grounded = !request.tools.is_empty(),
            "Sending generateContent request"
        );

        let resp = self
            .http_client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);

            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => GeminiError::RateLimit(message),
                _ => GeminiError::ApiError {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let response: GenerateContentResponse = resp.json().await?;
        Ok(response)
    }
}
