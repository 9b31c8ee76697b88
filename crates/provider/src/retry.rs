//! Exponential backoff for transient provider errors.
//!
//! Used around each submission call. The attempt cap is small: a unit that
//! keeps failing is reported as failed and its siblings carry on.

use std::future::Future;
use std::time::Duration;

use crate::error::ProviderError;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
    /// Total attempts, including the first.
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            max_attempts: 3,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`RetryConfig::max_delay`].
pub fn next_delay(current: Duration, config: &RetryConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Run `op` until it succeeds, fails permanently, or the attempt cap is
/// reached. Only [`ProviderError::is_transient`] errors are retried.
pub async fn retry_with_backoff<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut delay = config.initial_delay;
    let mut attempt = 1u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < config.max_attempts => {
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient provider error, retrying",
                );
                tokio::time::sleep(delay).await;
                delay = next_delay(delay, config);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
