use super::retry::with_backoff;
use super::{ConcurrencyLimiter, RateBudget, UpstreamPolicy};
use crate::error::{SyncError, SyncResult};
use crate::models::{ListingEntry, SpotMetaResponse, TokenDetail};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// The three upstream reads a sync pass needs.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_spot_listing(&self) -> SyncResult<Vec<ListingEntry>>;

    /// Opaque deploy events, passed through untouched.
    async fn fetch_deploy_listing(&self) -> SyncResult<Vec<Value>>;

    async fn fetch_token_detail(&self, token_id: &str) -> SyncResult<TokenDetail>;
}

/// HTTP client for the info endpoint (listing + details) and the deploy
/// listing endpoint. Every attempt spends budget and holds a concurrency slot
/// for the duration of the request; backoff sleeps hold neither.
pub struct UpstreamClient {
    http: reqwest::Client,
    info_url: Url,
    deploys_url: Url,
    budget: Arc<RateBudget>,
    limiter: ConcurrencyLimiter,
    policy: UpstreamPolicy,
}

impl UpstreamClient {
    pub fn new(
        info_url: Url,
        deploys_url: Url,
        budget: Arc<RateBudget>,
        limiter: ConcurrencyLimiter,
        policy: UpstreamPolicy,
    ) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(policy.request_timeout)
            .pool_max_idle_per_host(policy.max_in_flight)
            .user_agent(concat!("indexer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            info_url,
            deploys_url,
            budget,
            limiter,
            policy,
        })
    }

    /// Build the shared budget and limiter from `policy`.
    pub fn with_policy(info_url: Url, deploys_url: Url, policy: UpstreamPolicy) -> SyncResult<Self> {
        let budget = RateBudget::new(policy.weight_limit, policy.reset_interval);
        let limiter = ConcurrencyLimiter::new(policy.max_in_flight);
        Self::new(info_url, deploys_url, budget, limiter, policy)
    }

    async fn call<T, F, Fut>(&self, operation: &'static str, request: F) -> SyncResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = SyncResult<T>>,
    {
        let request = &request;
        with_backoff(&self.policy.retry, operation, move || async move {
            self.budget.reserve(self.policy.request_weight).await;
            self.limiter.run(request()).await
        })
        .await
    }

    async fn post_info<T: DeserializeOwned>(&self, operation: &str, body: &Value) -> SyncResult<T> {
        let response = self
            .http
            .post(self.info_url.clone())
            .json(body)
            .send()
            .await?;
        decode(operation, response).await
    }
}

async fn decode<T: DeserializeOwned>(operation: &str, response: Response) -> SyncResult<T> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(SyncError::RateLimitExceeded);
    }
    if !status.is_success() {
        return Err(SyncError::UpstreamUnavailable(format!(
            "{} returned HTTP {}",
            operation, status
        )));
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        SyncError::UpstreamProtocol(format!("Invalid API response for {}: {}", operation, e))
    })
}

#[async_trait]
impl TokenSource for UpstreamClient {
    async fn fetch_spot_listing(&self) -> SyncResult<Vec<ListingEntry>> {
        let body = &json!({ "type": "spotMeta" });
        let meta: SpotMetaResponse = self
            .call("spotMeta", move || self.post_info("spotMeta", body))
            .await?;

        let tokens = meta.tokens.ok_or_else(|| {
            SyncError::UpstreamProtocol("Invalid API response for spotMeta: no tokens".to_string())
        })?;

        debug!(count = tokens.len(), "Fetched spot listing");
        Ok(tokens)
    }

    async fn fetch_deploy_listing(&self) -> SyncResult<Vec<Value>> {
        let value: Value = self
            .call("deploys", move || async move {
                let response = self.http.get(self.deploys_url.clone()).send().await?;
                decode("deploys", response).await
            })
            .await?;

        match value {
            Value::Array(deploys) => {
                debug!(count = deploys.len(), "Fetched deploy listing");
                Ok(deploys)
            }
            other => Err(SyncError::UpstreamProtocol(format!(
                "Invalid API response for deploys: expected array, got {}",
                type_name(&other)
            ))),
        }
    }

    async fn fetch_token_detail(&self, token_id: &str) -> SyncResult<TokenDetail> {
        let body = &json!({ "type": "tokenDetails", "tokenId": token_id });
        let detail: TokenDetail = self
            .call("tokenDetails", move || self.post_info("tokenDetails", body))
            .await?;

        match detail.name.as_deref() {
            Some(name) if !name.is_empty() => Ok(detail),
            _ => Err(SyncError::UpstreamProtocol(format!(
                "Details not found for tokenId: {}",
                token_id
            ))),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
