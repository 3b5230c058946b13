//! Combines a fresh listing entry and detail with the stored record.
//!
//! Identity and automated fields come from upstream, `start_px` from the
//! reference table (falling back to what is stored), and curated fields are
//! always carried over from the stored record.

use crate::models::{CuratedFields, ListingEntry, TokenDetail, TokenRecord};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

pub fn merge(
    listing: &ListingEntry,
    detail: &TokenDetail,
    existing: Option<&TokenRecord>,
    reference_price: Option<&str>,
) -> TokenRecord {
    let start_px = non_empty(reference_price)
        .map(str::to_string)
        .or_else(|| existing.and_then(|e| e.start_px.clone()));

    let circulating_supply = non_empty(detail.circulating_supply.as_deref());

    TokenRecord {
        name: listing.name.clone(),
        token_id: listing.token_id.clone(),
        token_index: listing.index,
        auction_price: auction_price(detail.seeded_usdc.as_deref(), circulating_supply),
        launch_market_cap: launch_market_cap(start_px.as_deref(), circulating_supply),
        start_px,
        mark_px: non_empty(detail.mark_px.as_deref()).map(str::to_string),
        launch_date: launch_date(detail.deploy_time.as_deref()),
        launch_circ_supply: circulating_supply.map(str::to_string),
        curated: existing
            .map(|e| e.curated.clone())
            .unwrap_or_else(CuratedFields::default),
        last_updated: existing.and_then(|e| e.last_updated),
    }
}

/// `seededUsdc / circulatingSupply`, only for a nonzero seed.
fn auction_price(seeded_usdc: Option<&str>, circulating_supply: Option<&str>) -> Option<String> {
    let seeded = parse_decimal(seeded_usdc?)?;
    if seeded.is_zero() {
        return None;
    }
    let supply = parse_decimal(circulating_supply?)?;
    let price = seeded.checked_div(supply)?;
    Some(price.normalize().to_string())
}

/// `startPx * circulatingSupply`, fixed to two decimals.
fn launch_market_cap(start_px: Option<&str>, circulating_supply: Option<&str>) -> Option<String> {
    let start = parse_decimal(start_px?)?;
    let supply = parse_decimal(circulating_supply?)?;
    let cap = start
        .checked_mul(supply)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Some(format!("{:.2}", cap))
}

fn launch_date(deploy_time: Option<&str>) -> Option<String> {
    let date = deploy_time?.split('T').next()?;
    non_empty(Some(date)).map(str::to_string)
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
