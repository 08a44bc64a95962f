//! Exponential-backoff retry for rate-limited requests
//!
//! NCBI answers over-quota callers with HTTP 429. The policy here mirrors the
//! E-utilities guidance: wait, then try again with a doubled delay, up to a
//! fixed attempt ceiling. The growing delay is a local accumulator inside the
//! retry loop; nothing about the backoff is stored on the client.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

/// Classification of errors into retryable and fatal
pub trait RetryableError {
    /// Whether the operation that produced this error should be retried
    fn is_retryable(&self) -> bool;

    /// Short human-readable reason, used in retry log lines
    fn retry_reason(&self) -> &str;
}

/// Retry policy: attempt ceiling and initial backoff delay
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after every failed attempt
    pub initial_delay: Duration,
}

impl RetryConfig {
    pub fn new() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(30),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `operation`, retrying on retryable errors with doubling delays.
///
/// Fatal errors and errors on the final attempt are returned as-is, so the
/// caller always sees the original error rather than a retry wrapper.
pub async fn with_retry<T, E, F, Fut>(
    operation: F,
    config: &RetryConfig,
    description: &str,
) -> std::result::Result<T, E>
where
    E: RetryableError,
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let mut delay = config.initial_delay;
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < config.max_attempts => {
                warn!(
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    reason = err.retry_reason(),
                    "{} failed, retrying after backoff",
                    description
                );
                sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
