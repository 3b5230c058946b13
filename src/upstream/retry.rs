use crate::error::{SyncError, SyncResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Exponential backoff applied to rate-limited (HTTP 429) responses only.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry + 1`: `base * 2^retry`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << retry.min(31))
    }
}

/// Run `attempt` until it succeeds, fails with anything other than
/// [`SyncError::RateLimitExceeded`], or the retries run out. Exhausted
/// retries surface as [`SyncError::UpstreamUnavailable`].
pub async fn with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt: F,
) -> SyncResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SyncResult<T>>,
{
    let mut retry = 0;

    loop {
        match attempt().await {
            Err(SyncError::RateLimitExceeded) if retry < policy.max_retries => {
                let delay = policy.delay_for(retry);
                retry += 1;
                warn!(
                    operation,
                    retry,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "⏳ Rate limited, backing off"
                );
                sleep(delay).await;
            }
            Err(SyncError::RateLimitExceeded) => {
                return Err(SyncError::UpstreamUnavailable(format!(
                    "{} still rate limited after {} retries",
                    operation, policy.max_retries
                )));
            }
            other => return other,
        }
    }
}
