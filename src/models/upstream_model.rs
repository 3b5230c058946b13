use serde::{Deserialize, Serialize};

use super::de::opt_string_or_number;

/// Body of the `spotMeta` info request. `tokens` is optional so a missing
/// field can be reported as a protocol error instead of a decode error.
#[derive(Debug, Deserialize)]
pub struct SpotMetaResponse {
    pub tokens: Option<Vec<ListingEntry>>,
}

/// Minimal token identity from the metadata listing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ListingEntry {
    pub name: String,
    #[serde(rename = "tokenId")]
    pub token_id: String,
    pub index: i64,
}

/// Per-token detail from the `tokenDetails` info request. Only the fields the
/// merge reads are kept.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TokenDetail {
    pub name: Option<String>,
    #[serde(rename = "markPx", default, deserialize_with = "opt_string_or_number")]
    pub mark_px: Option<String>,
    #[serde(rename = "deployTime", default)]
    pub deploy_time: Option<String>,
    #[serde(rename = "seededUsdc", default, deserialize_with = "opt_string_or_number")]
    pub seeded_usdc: Option<String>,
    #[serde(
        rename = "circulatingSupply",
        default,
        deserialize_with = "opt_string_or_number"
    )]
    pub circulating_supply: Option<String>,
}
