use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use super::de::{opt_string_or_number, patch_string_or_number};

// ==========================================
// 1. DATABASE MODELS (Postgres)
// ==========================================

/// A row of the 'tokens' table. `token_index` is the stable join key shared
/// with the REST layer and the admin editor.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub name: String,
    pub token_id: String,
    pub token_index: i64,

    pub start_px: Option<String>,
    pub mark_px: Option<String>,
    pub launch_date: Option<String>,
    pub auction_price: Option<String>,
    pub launch_circ_supply: Option<String>,
    pub launch_market_cap: Option<String>,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub curated: CuratedFields,

    pub last_updated: Option<DateTime<Utc>>,
}

/// Fields only an admin edits. The sync pass carries them forward untouched.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuratedFields {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub team_allocation: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub airdrop1: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub airdrop2: Option<String>,

    #[serde(default)]
    pub dev_reputation: bool,
    #[serde(default)]
    pub spread_less_than_three: bool,
    #[serde(default)]
    pub thick_ob_liquidity: bool,
    #[serde(default)]
    pub no_sell_pressure: bool,

    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub telegram: String,
    #[serde(default)]
    pub discord: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub comment: String,
}

impl Default for CuratedFields {
    fn default() -> Self {
        Self {
            team_allocation: None,
            airdrop1: None,
            airdrop2: None,
            dev_reputation: false,
            spread_less_than_three: false,
            thick_ob_liquidity: false,
            no_sell_pressure: false,
            twitter: String::new(),
            telegram: String::new(),
            discord: String::new(),
            website: String::new(),
            comment: String::new(),
        }
    }
}

/// Partial update sent by the admin editor. Absent fields are left as-is;
/// the nullable allocation fields are cleared by an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuratedPatch {
    #[serde(default, deserialize_with = "patch_string_or_number")]
    pub team_allocation: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_string_or_number")]
    pub airdrop1: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_string_or_number")]
    pub airdrop2: Option<Option<String>>,
    pub dev_reputation: Option<bool>,
    pub spread_less_than_three: Option<bool>,
    pub thick_ob_liquidity: Option<bool>,
    pub no_sell_pressure: Option<bool>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub discord: Option<String>,
    pub website: Option<String>,
    pub comment: Option<String>,
}

impl CuratedPatch {
    pub fn is_empty(&self) -> bool {
        self.team_allocation.is_none()
            && self.airdrop1.is_none()
            && self.airdrop2.is_none()
            && self.dev_reputation.is_none()
            && self.spread_less_than_three.is_none()
            && self.thick_ob_liquidity.is_none()
            && self.no_sell_pressure.is_none()
            && self.twitter.is_none()
            && self.telegram.is_none()
            && self.discord.is_none()
            && self.website.is_none()
            && self.comment.is_none()
    }

    /// Apply the patch onto an in-memory copy of the curated fields.
    pub fn apply(&self, curated: &mut CuratedFields) {
        if let Some(v) = &self.team_allocation {
            curated.team_allocation = v.clone();
        }
        if let Some(v) = &self.airdrop1 {
            curated.airdrop1 = v.clone();
        }
        if let Some(v) = &self.airdrop2 {
            curated.airdrop2 = v.clone();
        }
        if let Some(v) = self.dev_reputation {
            curated.dev_reputation = v;
        }
        if let Some(v) = self.spread_less_than_three {
            curated.spread_less_than_three = v;
        }
        if let Some(v) = self.thick_ob_liquidity {
            curated.thick_ob_liquidity = v;
        }
        if let Some(v) = self.no_sell_pressure {
            curated.no_sell_pressure = v;
        }
        if let Some(v) = &self.twitter {
            curated.twitter = v.clone();
        }
        if let Some(v) = &self.telegram {
            curated.telegram = v.clone();
        }
        if let Some(v) = &self.discord {
            curated.discord = v.clone();
        }
        if let Some(v) = &self.website {
            curated.website = v.clone();
        }
        if let Some(v) = &self.comment {
            curated.comment = v.clone();
        }
    }
}

/// Launch price reference, a row of the 'start_px' table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencePrice {
    pub index: i64,
    pub start_px: String,
}

/// Row of the 'users' table.
#[derive(Debug, Clone, FromRow)]
pub struct AdminUser {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serializes_camel_case_with_flat_curated_fields() {
        let record = TokenRecord {
            name: "FOO".to_string(),
            token_id: "0x1".to_string(),
            token_index: 7,
            start_px: Some("1.0".to_string()),
            mark_px: None,
            launch_date: None,
            auction_price: None,
            launch_circ_supply: None,
            launch_market_cap: None,
            curated: CuratedFields::default(),
            last_updated: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["tokenIndex"], json!(7));
        assert_eq!(value["startPx"], json!("1.0"));
        assert_eq!(value["spreadLessThanThree"], json!(false));
        assert_eq!(value["twitter"], json!(""));
        assert_eq!(value["teamAllocation"], json!(null));
        assert!(value.get("curated").is_none());
    }

    #[test]
    fn test_patch_accepts_numbers_for_allocations() {
        let patch: CuratedPatch =
            serde_json::from_value(json!({ "teamAllocation": 12.5, "comment": "ok" })).unwrap();
        assert_eq!(patch.team_allocation, Some(Some("12.5".to_string())));
        assert_eq!(patch.comment.as_deref(), Some("ok"));
        assert!(patch.airdrop1.is_none());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_only_touches_present_fields() {
        let mut curated = CuratedFields {
            twitter: "@foo".to_string(),
            dev_reputation: true,
            ..CuratedFields::default()
        };
        let patch = CuratedPatch {
            comment: Some("watch".to_string()),
            ..CuratedPatch::default()
        };

        patch.apply(&mut curated);

        assert_eq!(curated.twitter, "@foo");
        assert!(curated.dev_reputation);
        assert_eq!(curated.comment, "watch");
    }

    #[test]
    fn test_patch_null_clears_allocation() {
        let patch: CuratedPatch =
            serde_json::from_value(json!({ "teamAllocation": null, "airdrop1": "5" })).unwrap();
        assert_eq!(patch.team_allocation, Some(None));
        assert_eq!(patch.airdrop1, Some(Some("5".to_string())));
        assert!(patch.airdrop2.is_none());
        assert!(!patch.is_empty());

        let mut curated = CuratedFields {
            team_allocation: Some("20".to_string()),
            airdrop2: Some("1".to_string()),
            ..CuratedFields::default()
        };
        patch.apply(&mut curated);

        assert!(curated.team_allocation.is_none());
        assert_eq!(curated.airdrop1.as_deref(), Some("5"));
        assert_eq!(curated.airdrop2.as_deref(), Some("1"));
    }
}
