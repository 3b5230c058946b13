//! Persistence seam shared by the sync pass and the REST layer.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::SyncResult;
use crate::models::{AdminUser, CuratedPatch, ReferencePrice, TokenRecord, UpsertOutcome};
use async_trait::async_trait;

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn list_tokens(&self) -> SyncResult<Vec<TokenRecord>>;

    async fn get_token(&self, token_index: i64) -> SyncResult<Option<TokenRecord>>;

    /// Insert when `token_index` is new, otherwise refresh identity and
    /// automated fields only. A stored `start_px` is never replaced by null.
    async fn upsert_token(&self, token: &TokenRecord) -> SyncResult<UpsertOutcome>;

    /// Admin edit: apply `patch` and stamp `last_updated`.
    async fn update_curated(
        &self,
        token_index: i64,
        patch: &CuratedPatch,
    ) -> SyncResult<Option<TokenRecord>>;

    async fn reference_prices(&self) -> SyncResult<Vec<ReferencePrice>>;

    async fn find_admin(&self, username: &str) -> SyncResult<Option<AdminUser>>;

    async fn insert_admin(&self, username: &str, password_hash: &str) -> SyncResult<bool>;
}
