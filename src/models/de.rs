use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Upstream and admin payloads mix `"1.5"` and `1.5` for the same field.
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Patch field: absent leaves the value alone (`None`, via `#[serde(default)]`),
/// `null` clears it (`Some(None)`).
pub fn patch_string_or_number<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    opt_string_or_number(deserializer).map(Some)
}
