pub mod merge;
pub mod orchestrator;
pub mod scheduler;

pub use merge::merge;
pub use orchestrator::{PassOutcome, PassState, SyncOrchestrator, SyncReport};
pub use scheduler::run_scheduler;

use crate::config::SyncConfig;
use crate::store::TokenStore;
use crate::upstream::{UpstreamClient, UpstreamPolicy};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Wire the production upstream client into an orchestrator.
pub fn orchestrator_from_config(
    config: &SyncConfig,
    store: Arc<dyn TokenStore>,
) -> Result<Arc<SyncOrchestrator>> {
    let policy = UpstreamPolicy::default();
    let detail_concurrency = policy.max_in_flight;

    let client = UpstreamClient::with_policy(
        config.hyperliquid_api_url.clone(),
        config.hypurrscan_api_url.clone(),
        policy,
    )
    .context("Failed to build upstream HTTP client")?;

    Ok(Arc::new(SyncOrchestrator::new(
        store,
        Arc::new(client),
        detail_concurrency,
        config.stage_timeout,
    )))
}
