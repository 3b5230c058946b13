use super::merge::merge;
use crate::error::{SyncError, SyncResult};
use crate::models::{ListingEntry, TokenRecord, UpsertOutcome};
use crate::store::TokenStore;
use crate::upstream::TokenSource;
use chrono::{DateTime, Utc};
use futures_util::{StreamExt, stream};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PassState {
    Idle,
    Fetching,
    PerTokenProcessing,
    Done,
}

impl PassState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => PassState::Fetching,
            2 => PassState::PerTokenProcessing,
            3 => PassState::Done,
            _ => PassState::Idle,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub listed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
    pub deploys: usize,
    pub elapsed_ms: u64,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    Completed(SyncReport),
    /// Another pass was already running; this request was dropped.
    Skipped,
}

/// Runs sync passes. At most one pass is in flight; requests arriving while
/// one runs are dropped, not queued.
///
/// `stage_timeout` bounds the fetch stage and each token separately, never
/// the pass as a whole: a long listing paced by the rate budget still runs
/// to the end, and a stuck token only counts as failed.
pub struct SyncOrchestrator {
    store: Arc<dyn TokenStore>,
    source: Arc<dyn TokenSource>,
    detail_concurrency: usize,
    stage_timeout: Option<Duration>,
    in_flight: Mutex<()>,
    state: AtomicU8,
    last_report: RwLock<Option<SyncReport>>,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn TokenStore>,
        source: Arc<dyn TokenSource>,
        detail_concurrency: usize,
        stage_timeout: Option<Duration>,
    ) -> Self {
        Self {
            store,
            source,
            detail_concurrency: detail_concurrency.max(1),
            stage_timeout,
            in_flight: Mutex::new(()),
            state: AtomicU8::new(PassState::Idle as u8),
            last_report: RwLock::new(None),
        }
    }

    pub fn state(&self) -> PassState {
        PassState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub async fn last_report(&self) -> Option<SyncReport> {
        self.last_report.read().await.clone()
    }

    /// One full fetch → merge → upsert pass.
    ///
    /// Only fetch-stage failures (listing, deploys, store snapshot, or the
    /// stage running past its deadline) produce an error; per-token failures
    /// are counted in the report.
    pub async fn run_sync_pass(&self) -> SyncResult<PassOutcome> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("Sync pass already in flight, dropping request");
            return Ok(PassOutcome::Skipped);
        };

        match self.execute_pass().await {
            Ok(report) => {
                self.set_state(PassState::Done);
                *self.last_report.write().await = Some(report.clone());
                Ok(PassOutcome::Completed(report))
            }
            Err(e) => {
                self.set_state(PassState::Idle);
                Err(e)
            }
        }
    }

    async fn execute_pass(&self) -> SyncResult<SyncReport> {
        let started = Instant::now();
        self.set_state(PassState::Fetching);

        let (listing, deploys, current, reference) = self
            .within_deadline(async {
                tokio::try_join!(
                    self.source.fetch_spot_listing(),
                    self.source.fetch_deploy_listing(),
                    self.store.list_tokens(),
                    self.store.reference_prices(),
                )
            })
            .await?;

        debug!(
            listed = listing.len(),
            deploys = deploys.len(),
            stored = current.len(),
            reference_prices = reference.len(),
            "Fetch stage complete"
        );

        let current: HashMap<i64, TokenRecord> =
            current.into_iter().map(|t| (t.token_index, t)).collect();
        let reference: HashMap<i64, String> =
            reference.into_iter().map(|p| (p.index, p.start_px)).collect();

        self.set_state(PassState::PerTokenProcessing);

        let mut report = SyncReport {
            listed: listing.len(),
            deploys: deploys.len(),
            ..SyncReport::default()
        };

        let current = &current;
        let reference = &reference;
        let outcomes: Vec<SyncResult<UpsertOutcome>> = stream::iter(listing)
            .map(move |entry| async move {
                let outcome = self
                    .within_deadline(self.process_token(
                        &entry,
                        current.get(&entry.index),
                        reference.get(&entry.index).map(String::as_str),
                    ))
                    .await;

                if let Err(e) = &outcome {
                    error!(
                        token = %entry.name,
                        token_index = entry.index,
                        token_id = %entry.token_id,
                        error = %e,
                        "Error processing token"
                    );
                }
                outcome
            })
            .buffer_unordered(self.detail_concurrency)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                Ok(UpsertOutcome::Inserted) => report.inserted += 1,
                Ok(UpsertOutcome::Updated) => report.updated += 1,
                Err(_) => report.failed += 1,
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        report.finished_at = Some(Utc::now());

        info!(
            listed = report.listed,
            inserted = report.inserted,
            updated = report.updated,
            failed = report.failed,
            deploys = report.deploys,
            elapsed_ms = report.elapsed_ms,
            "✅ Token data updated"
        );

        Ok(report)
    }

    async fn process_token(
        &self,
        entry: &ListingEntry,
        existing: Option<&TokenRecord>,
        reference_price: Option<&str>,
    ) -> SyncResult<UpsertOutcome> {
        let detail = self.source.fetch_token_detail(&entry.token_id).await?;
        let record = merge(entry, &detail, existing, reference_price);
        let outcome = self.store.upsert_token(&record).await?;

        match outcome {
            UpsertOutcome::Inserted => {
                info!(token = %entry.name, token_index = entry.index, "📥 New token found")
            }
            UpsertOutcome::Updated => {
                debug!(token = %entry.name, token_index = entry.index, "Token refreshed")
            }
        }

        Ok(outcome)
    }

    async fn within_deadline<T>(&self, fut: impl Future<Output = SyncResult<T>>) -> SyncResult<T> {
        match self.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .unwrap_or(Err(SyncError::Timeout(limit))),
            None => fut.await,
        }
    }

    fn set_state(&self, state: PassState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}
