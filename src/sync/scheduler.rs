use super::{PassOutcome, SyncOrchestrator};
use crate::error::SyncResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{error, info};

/// Run a pass now, then once per `every`. A failed pass is logged and the
/// next tick still fires. Never returns.
pub async fn run_scheduler(orchestrator: Arc<SyncOrchestrator>, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = IntervalStream::new(ticker);

    info!(every_ms = every.as_millis() as u64, "⏰ Sync scheduler started");

    while ticks.next().await.is_some() {
        let result = orchestrator.run_sync_pass().await;
        log_outcome(&result);
    }
}

pub fn log_outcome(result: &SyncResult<PassOutcome>) {
    match result {
        Ok(PassOutcome::Completed(report)) if report.failed > 0 => info!(
            failed = report.failed,
            listed = report.listed,
            "Sync pass finished with per-token failures"
        ),
        Ok(PassOutcome::Completed(_)) => {}
        Ok(PassOutcome::Skipped) => info!("Sync pass skipped, previous pass still running"),
        Err(e) => error!(error = %e, "❌ Error during token update"),
    }
}
