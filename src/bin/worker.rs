use anyhow::Result;
use indexer::config::SyncConfig;
use indexer::db::get_db_pool;
use indexer::store::{PgStore, TokenStore};
use indexer::sync::{orchestrator_from_config, run_scheduler};
use indexer::telemetry::init_tracing;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("🎧 Starting token indexer worker");

    let config = SyncConfig::from_env()?;
    let pool = get_db_pool(&config.database_url).await?;
    let store: Arc<dyn TokenStore> = Arc::new(PgStore::new(pool));

    let orchestrator = orchestrator_from_config(&config, store)?;
    run_scheduler(orchestrator, config.polling_interval).await;

    Ok(())
}
