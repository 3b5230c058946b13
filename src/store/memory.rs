use super::TokenStore;
use crate::error::SyncResult;
use crate::models::{AdminUser, CuratedPatch, ReferencePrice, TokenRecord, UpsertOutcome};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// In-process store with the same upsert semantics as [`super::PgStore`].
#[derive(Default)]
pub struct MemoryStore {
    tokens: RwLock<BTreeMap<i64, TokenRecord>>,
    reference_prices: RwLock<Vec<ReferencePrice>>,
    users: RwLock<HashMap<String, AdminUser>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_reference_price(&self, index: i64, start_px: &str) {
        let mut prices = self.reference_prices.write().await;
        prices.retain(|p| p.index != index);
        prices.push(ReferencePrice {
            index,
            start_px: start_px.to_string(),
        });
    }

    pub async fn clear_reference_prices(&self) {
        self.reference_prices.write().await.clear();
    }

    /// Raw write, bypassing upsert rules.
    pub async fn put_token(&self, token: TokenRecord) {
        self.tokens.write().await.insert(token.token_index, token);
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn list_tokens(&self) -> SyncResult<Vec<TokenRecord>> {
        Ok(self.tokens.read().await.values().cloned().collect())
    }

    async fn get_token(&self, token_index: i64) -> SyncResult<Option<TokenRecord>> {
        Ok(self.tokens.read().await.get(&token_index).cloned())
    }

    async fn upsert_token(&self, token: &TokenRecord) -> SyncResult<UpsertOutcome> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(&token.token_index) {
            Some(stored) => {
                stored.name = token.name.clone();
                stored.token_id = token.token_id.clone();
                if token.start_px.as_deref().is_some_and(|p| !p.is_empty()) {
                    stored.start_px = token.start_px.clone();
                }
                stored.mark_px = token.mark_px.clone();
                stored.launch_date = token.launch_date.clone();
                stored.auction_price = token.auction_price.clone();
                stored.launch_circ_supply = token.launch_circ_supply.clone();
                stored.launch_market_cap = token.launch_market_cap.clone();
                Ok(UpsertOutcome::Updated)
            }
            None => {
                let mut fresh = token.clone();
                fresh.last_updated = None;
                tokens.insert(token.token_index, fresh);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn update_curated(
        &self,
        token_index: i64,
        patch: &CuratedPatch,
    ) -> SyncResult<Option<TokenRecord>> {
        let mut tokens = self.tokens.write().await;
        let Some(stored) = tokens.get_mut(&token_index) else {
            return Ok(None);
        };
        patch.apply(&mut stored.curated);
        stored.last_updated = Some(Utc::now());
        Ok(Some(stored.clone()))
    }

    async fn reference_prices(&self) -> SyncResult<Vec<ReferencePrice>> {
        Ok(self.reference_prices.read().await.clone())
    }

    async fn find_admin(&self, username: &str) -> SyncResult<Option<AdminUser>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn insert_admin(&self, username: &str, password_hash: &str) -> SyncResult<bool> {
        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Ok(false);
        }
        users.insert(
            username.to_string(),
            AdminUser {
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(true)
    }
}
