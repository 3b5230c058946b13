use super::{AdminUser, CuratedPatch, ReferencePrice, TokenRecord, UpsertOutcome};
use anyhow::{Context, Result};
use sqlx::{PgPool, Row};

const TOKEN_COLUMNS: &str = r#"
    name,
    token_id,
    token_index,
    start_px,
    mark_px,
    launch_date,
    auction_price,
    launch_circ_supply,
    launch_market_cap,
    team_allocation,
    airdrop1,
    airdrop2,
    dev_reputation,
    spread_less_than_three,
    thick_ob_liquidity,
    no_sell_pressure,
    twitter,
    telegram,
    discord,
    website,
    comment,
    last_updated
"#;

// ==========================================
// TOKEN OPERATIONS
// ==========================================

/// All tokens, ordered by index
pub async fn list_tokens(pool: &PgPool) -> Result<Vec<TokenRecord>> {
    let tokens = sqlx::query_as::<_, TokenRecord>(&format!(
        "SELECT {TOKEN_COLUMNS} FROM tokens ORDER BY token_index"
    ))
    .fetch_all(pool)
    .await
    .context("Failed to fetch tokens")?;

    Ok(tokens)
}

/// Get token by index
pub async fn get_token(pool: &PgPool, token_index: i64) -> Result<Option<TokenRecord>> {
    let token = sqlx::query_as::<_, TokenRecord>(&format!(
        "SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_index = $1"
    ))
    .bind(token_index)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch token")?;

    Ok(token)
}

/// Insert a token or refresh its automated columns.
///
/// Curated columns and `last_updated` are only written on insert, so an admin
/// edit landing mid-pass survives. `start_px` never goes back to NULL.
pub async fn upsert_token(pool: &PgPool, token: &TokenRecord) -> Result<UpsertOutcome> {
    let curated = &token.curated;

    let row = sqlx::query(
        r#"
        INSERT INTO tokens (
            name, token_id, token_index, start_px, mark_px, launch_date,
            auction_price, launch_circ_supply, launch_market_cap,
            team_allocation, airdrop1, airdrop2, dev_reputation,
            spread_less_than_three, thick_ob_liquidity, no_sell_pressure,
            twitter, telegram, discord, website, comment
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
            $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
        )
        ON CONFLICT (token_index)
        DO UPDATE SET
            name = EXCLUDED.name,
            token_id = EXCLUDED.token_id,
            start_px = COALESCE(NULLIF(EXCLUDED.start_px, ''), tokens.start_px),
            mark_px = EXCLUDED.mark_px,
            launch_date = EXCLUDED.launch_date,
            auction_price = EXCLUDED.auction_price,
            launch_circ_supply = EXCLUDED.launch_circ_supply,
            launch_market_cap = EXCLUDED.launch_market_cap
        RETURNING (xmax = 0) AS inserted
        "#,
    )
    .bind(&token.name)
    .bind(&token.token_id)
    .bind(token.token_index)
    .bind(&token.start_px)
    .bind(&token.mark_px)
    .bind(&token.launch_date)
    .bind(&token.auction_price)
    .bind(&token.launch_circ_supply)
    .bind(&token.launch_market_cap)
    .bind(&curated.team_allocation)
    .bind(&curated.airdrop1)
    .bind(&curated.airdrop2)
    .bind(curated.dev_reputation)
    .bind(curated.spread_less_than_three)
    .bind(curated.thick_ob_liquidity)
    .bind(curated.no_sell_pressure)
    .bind(&curated.twitter)
    .bind(&curated.telegram)
    .bind(&curated.discord)
    .bind(&curated.website)
    .bind(&curated.comment)
    .fetch_one(pool)
    .await
    .context("Failed to upsert token")?;

    let inserted: bool = row.try_get("inserted")?;
    Ok(if inserted {
        UpsertOutcome::Inserted
    } else {
        UpsertOutcome::Updated
    })
}

/// Apply an admin patch and stamp `last_updated`. Returns `None` for an
/// unknown index. Allocation columns take a "present" flag so `null` can
/// clear them.
pub async fn update_curated(
    pool: &PgPool,
    token_index: i64,
    patch: &CuratedPatch,
) -> Result<Option<TokenRecord>> {
    let token = sqlx::query_as::<_, TokenRecord>(&format!(
        r#"
        UPDATE tokens SET
            team_allocation = CASE WHEN $2 THEN $3 ELSE team_allocation END,
            airdrop1 = CASE WHEN $4 THEN $5 ELSE airdrop1 END,
            airdrop2 = CASE WHEN $6 THEN $7 ELSE airdrop2 END,
            dev_reputation = COALESCE($8, dev_reputation),
            spread_less_than_three = COALESCE($9, spread_less_than_three),
            thick_ob_liquidity = COALESCE($10, thick_ob_liquidity),
            no_sell_pressure = COALESCE($11, no_sell_pressure),
            twitter = COALESCE($12, twitter),
            telegram = COALESCE($13, telegram),
            discord = COALESCE($14, discord),
            website = COALESCE($15, website),
            comment = COALESCE($16, comment),
            last_updated = NOW()
        WHERE token_index = $1
        RETURNING {TOKEN_COLUMNS}
        "#
    ))
    .bind(token_index)
    .bind(patch.team_allocation.is_some())
    .bind(patch.team_allocation.clone().flatten())
    .bind(patch.airdrop1.is_some())
    .bind(patch.airdrop1.clone().flatten())
    .bind(patch.airdrop2.is_some())
    .bind(patch.airdrop2.clone().flatten())
    .bind(patch.dev_reputation)
    .bind(patch.spread_less_than_three)
    .bind(patch.thick_ob_liquidity)
    .bind(patch.no_sell_pressure)
    .bind(&patch.twitter)
    .bind(&patch.telegram)
    .bind(&patch.discord)
    .bind(&patch.website)
    .bind(&patch.comment)
    .fetch_optional(pool)
    .await
    .context("Failed to update token")?;

    Ok(token)
}

// ==========================================
// REFERENCE PRICES
// ==========================================

pub async fn list_reference_prices(pool: &PgPool) -> Result<Vec<ReferencePrice>> {
    let prices = sqlx::query_as::<_, ReferencePrice>(
        r#"
        SELECT index, start_px FROM start_px
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to fetch reference prices")?;

    Ok(prices)
}

// ==========================================
// ADMIN USERS
// ==========================================

pub async fn get_admin(pool: &PgPool, username: &str) -> Result<Option<AdminUser>> {
    let user = sqlx::query_as::<_, AdminUser>(
        r#"
        SELECT username, password_hash FROM users WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch user")?;

    Ok(user)
}

/// Returns `false` when the username already exists.
pub async fn insert_admin(pool: &PgPool, username: &str, password_hash: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, role)
        VALUES ($1, $2, 'admin')
        ON CONFLICT (username) DO NOTHING
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .execute(pool)
    .await
    .context("Failed to insert user")?;

    Ok(result.rows_affected() == 1)
}
