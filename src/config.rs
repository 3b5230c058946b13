use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Settings the sync pass needs. Shared by the API server and the worker.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub database_url: String,
    pub hyperliquid_api_url: Url,
    pub hypurrscan_api_url: Url,
    pub polling_interval: Duration,
    /// Deadline for the fetch stage and for each token, not the whole pass.
    pub stage_timeout: Option<Duration>,
}

impl SyncConfig {
    pub fn from_env() -> Result<Self> {
        let polling_ms: u64 = parse_or("POLLING_INTERVAL", 60_000)?;
        let timeout_secs: u64 = parse_or("SYNC_STAGE_TIMEOUT_SECS", 300)?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            hyperliquid_api_url: required_url("HYPERLIQUID_API_URL")?,
            hypurrscan_api_url: required_url("HYPURRSCAN_API_URL")?,
            polling_interval: Duration::from_millis(polling_ms.max(1_000)),
            stage_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        })
    }
}

/// Settings for the REST layer.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: Option<HeaderValue>,
    pub jwt_secret: String,
    pub cron_secret: Option<String>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        let cors_origin = match env::var("CORS_ORIGIN") {
            Ok(origin) if !origin.is_empty() => Some(
                HeaderValue::from_str(&origin).context("CORS_ORIGIN is not a valid header value")?,
            ),
            _ => None,
        };

        Ok(Self {
            port: parse_or("PORT", 3000)?,
            cors_origin,
            jwt_secret: required("JWT_SECRET")?,
            cron_secret: env::var("CRON_SECRET").ok().filter(|s| !s.is_empty()),
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{} must be set in .env", name))
}

fn required_url(name: &str) -> Result<Url> {
    let raw = required(name)?;
    Url::parse(&raw).with_context(|| format!("{} is not a valid URL: {}", name, raw))
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", name, raw)),
        _ => Ok(default),
    }
}
