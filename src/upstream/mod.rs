pub mod budget;
pub mod client;
pub mod limiter;
pub mod retry;

pub use budget::RateBudget;
pub use client::{TokenSource, UpstreamClient};
pub use limiter::ConcurrencyLimiter;
pub use retry::RetryPolicy;

use std::time::Duration;

/// Request-weight and concurrency policy for the upstream APIs.
#[derive(Debug, Clone)]
pub struct UpstreamPolicy {
    /// Weight units granted per window.
    pub weight_limit: u32,
    pub reset_interval: Duration,
    /// Weight charged for each attempt of each operation.
    pub request_weight: u32,
    pub retry: RetryPolicy,
    pub max_in_flight: usize,
    pub request_timeout: Duration,
}

impl Default for UpstreamPolicy {
    fn default() -> Self {
        Self {
            weight_limit: 1200,
            reset_interval: Duration::from_secs(60),
            request_weight: 20,
            retry: RetryPolicy::default(),
            max_in_flight: 5,
            request_timeout: Duration::from_secs(15),
        }
    }
}
