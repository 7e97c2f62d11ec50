use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::AssistantError;

/// Exponential backoff: `base_delay`, then doubling, never above `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, AssistantError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AssistantError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempt >= max_attempts => {
                    return Err(AssistantError::Exhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    })
                }
                Err(err) => {
                    let delay = self.delay_for(attempt);
                    warn!(attempt, max_attempts, ?delay, error = %err, "retrying generative call");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
