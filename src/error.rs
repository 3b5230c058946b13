use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Upstream protocol error: {0}")]
    UpstreamProtocol(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Sync pass exceeded deadline of {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::UpstreamProtocol(err.to_string())
        } else {
            SyncError::UpstreamUnavailable(err.to_string())
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
