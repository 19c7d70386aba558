pub mod error;
pub mod gemini;
pub mod retry;

pub use error::AgentError;
pub use gemini::{GeminiClient, GeminiError, GenerativeModel, GEMINI_2_0_FLASH};
pub use retry::{with_retry, RateLimited, RetryConfig};
