use anyhow::{Context, Result};
use indexer::api::{self, AdminAuth, AppState};
use indexer::config::{ApiConfig, SyncConfig};
use indexer::db::get_db_pool;
use indexer::store::{PgStore, TokenStore};
use indexer::sync::{orchestrator_from_config, run_scheduler};
use indexer::telemetry::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("🚀 Starting token indexer");

    let sync_config = SyncConfig::from_env()?;
    let api_config = ApiConfig::from_env()?;

    let pool = get_db_pool(&sync_config.database_url).await?;
    let store: Arc<dyn TokenStore> = Arc::new(PgStore::new(pool));

    let orchestrator = orchestrator_from_config(&sync_config, store.clone())?;
    tokio::spawn(run_scheduler(
        orchestrator.clone(),
        sync_config.polling_interval,
    ));

    let state = AppState {
        store,
        orchestrator,
        auth: Arc::new(AdminAuth::new(api_config.jwt_secret.clone())),
        cron_secret: api_config.cron_secret.clone(),
    };
    let app = api::router(state, api_config.cors_origin.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], api_config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, "🌐 API listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
