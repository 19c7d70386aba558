//! Exponential backoff for rate-limited model calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

/// Errors that can tell a quota rejection (HTTP 429) apart from other failures.
pub trait RateLimited {
    fn is_rate_limited(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(2),
            multiplier: 2,
        }
    }
}

/// Run `f`, retrying only on rate-limit errors until `max_retries` is spent.
///
/// Any other error is returned unchanged after a single call. When the budget
/// runs out the last rate-limit error is returned.
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    operation: &str,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RateLimited + Display,
{
    let mut retries_left = config.max_retries;
    let mut delay = config.initial_delay;

    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_rate_limited() && retries_left > 0 => {
                warn!(
                    operation,
                    delay_ms = delay.as_millis() as u64,
                    retries_left,
                    error = %e,
                    "Rate limit hit, retrying"
                );
                sleep(delay).await;
                retries_left -= 1;
                delay = delay.saturating_mul(config.multiplier);
            }
            Err(e) => return Err(e),
        }
    }
}
