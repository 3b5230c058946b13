use anyhow::{Context, Result};
use indexer::api::auth::ADMIN_USERNAME;
use indexer::db::get_db_pool;
use indexer::models::queries;
use indexer::telemetry::init_tracing;
use std::env;
use tracing::info;

const BCRYPT_COST: u32 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set in .env")?;
    let password = env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set in .env")?;

    let pool = get_db_pool(&database_url).await?;

    let hash = bcrypt::hash(password, BCRYPT_COST).context("Failed to hash admin password")?;

    if queries::insert_admin(&pool, ADMIN_USERNAME, &hash).await? {
        info!("✅ Admin user created");
    } else {
        info!("Admin user already exists, nothing to do");
    }

    Ok(())
}
