//! Deterministic cache keys derived from filter state.

use rankdash_core::{FilterDict, FilterValue};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Hex characters kept from the digest.
pub const DIGEST_LEN: usize = 7;

/// Join stringified items in sorted order. Empty input joins to `""`.
///
/// Items may themselves contain commas; keys only need to be stable, not
/// reversible.
pub fn cache_join<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: ToString,
{
    let mut items: Vec<String> = items.into_iter().map(|item| item.to_string()).collect();
    items.sort();
    items.join(",")
}

/// Short digest of the compact JSON text of `data`.
pub fn hash_data(data: &Value) -> String {
    let digest = Sha256::digest(data.to_string().as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(DIGEST_LEN);
    hex
}

/// Scalars flatten to strings. Item sets become sorted arrays so the null
/// item stays a JSON `null` and never meets an item named `null`.
fn canonical_value(value: &FilterValue) -> Value {
    match value {
        FilterValue::Null => Value::String(String::new()),
        FilterValue::Text(text) => Value::String(text.clone()),
        FilterValue::Uint(n) => Value::String(n.to_string()),
        FilterValue::Bool(b) => Value::String(b.to_string()),
        FilterValue::Items(items) => Value::Array(
            items
                .iter()
                .map(|item| item.clone().map(Value::String).unwrap_or(Value::Null))
                .collect(),
        ),
    }
}

/// Builds `"<namespace>:<digest>"` keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Canonical JSON form of a filter dict: scalars flattened to strings,
    /// set members sorted.
    pub fn canonical(filter_dict: &FilterDict) -> Value {
        Value::Object(
            filter_dict
                .iter()
                .map(|(key, value)| (key.clone(), canonical_value(value)))
                .collect::<Map<String, Value>>(),
        )
    }

    /// Key for `namespace` over `filter_dict` and any extra disambiguating
    /// parameters. Post-limits must not be passed in `extra`.
    pub fn build(namespace: &str, filter_dict: &FilterDict, extra: &BTreeMap<String, Value>) -> String {
        let data = serde_json::json!({
            "namespace": namespace,
            "filters": Self::canonical(filter_dict),
            "extra": extra,
        });

        format!("{}:{}", namespace, hash_data(&data))
    }
}
