use super::TokenStore;
use crate::error::{SyncError, SyncResult};
use crate::models::{
    AdminUser, CuratedPatch, ReferencePrice, TokenRecord, UpsertOutcome, queries,
};
use async_trait::async_trait;
use sqlx::PgPool;

/// Postgres-backed store. Built from an already connected pool, so there is
/// no "not yet connected" state to check on each call.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_err(err: anyhow::Error) -> SyncError {
    SyncError::Store(format!("{:#}", err))
}

#[async_trait]
impl TokenStore for PgStore {
    async fn list_tokens(&self) -> SyncResult<Vec<TokenRecord>> {
        queries::list_tokens(&self.pool).await.map_err(store_err)
    }

    async fn get_token(&self, token_index: i64) -> SyncResult<Option<TokenRecord>> {
        queries::get_token(&self.pool, token_index)
            .await
            .map_err(store_err)
    }

    async fn upsert_token(&self, token: &TokenRecord) -> SyncResult<UpsertOutcome> {
        queries::upsert_token(&self.pool, token)
            .await
            .map_err(store_err)
    }

    async fn update_curated(
        &self,
        token_index: i64,
        patch: &CuratedPatch,
    ) -> SyncResult<Option<TokenRecord>> {
        queries::update_curated(&self.pool, token_index, patch)
            .await
            .map_err(store_err)
    }

    async fn reference_prices(&self) -> SyncResult<Vec<ReferencePrice>> {
        queries::list_reference_prices(&self.pool)
            .await
            .map_err(store_err)
    }

    async fn find_admin(&self, username: &str) -> SyncResult<Option<AdminUser>> {
        queries::get_admin(&self.pool, username)
            .await
            .map_err(store_err)
    }

    async fn insert_admin(&self, username: &str, password_hash: &str) -> SyncResult<bool> {
        queries::insert_admin(&self.pool, username, password_hash)
            .await
            .map_err(store_err)
    }
}
