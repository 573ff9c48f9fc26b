//! Query-string decoding.
//!
//! [`decode`] keeps keys decoded but values partially encoded, so every
//! filter can apply its own decoding. [`set_values`] is the shared parser
//! for comma-separated multi-value parameters.

use rankdash_core::RawParams;
use std::collections::BTreeSet;

use crate::codec::{unquote, unquote_plus};

/// The query component of a URI: after the first `?`, before any `#`.
fn query_component(uri: &str) -> &str {
    let without_fragment = uri.split('#').next().unwrap_or_default();
    without_fragment
        .split_once('?')
        .map(|(_, query)| query)
        .unwrap_or_default()
}

/// Parse the query string of `uri` into raw parameters.
///
/// Parts are separated by `&` or `;`. Each part is percent-decoded and split
/// on its first `=`; a part without `=` is a presence-only flag. Keys are
/// further decoded from `+`-as-space form. Repeated keys accumulate.
///
/// Malformed input never fails: an empty query yields a single empty key.
pub fn decode(uri: &str) -> RawParams {
    let mut params = RawParams::new();

    for part in query_component(uri).split(['&', ';']) {
        let part = unquote(part);
        let (key, value) = match part.split_once('=') {
            Some((key, value)) => (key, Some(value.to_string())),
            None => (part.as_str(), None),
        };
        params.push(unquote_plus(key), value);
    }

    params
}

/// Split a raw value on commas that separate items.
///
/// A comma only separates when the next character is a word character or a
/// double quote, so `Palestine, State of` survives as one item.
pub fn split_items(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;

    for (i, c) in value.char_indices() {
        if c != ',' {
            continue;
        }
        let next = value[i + 1..].chars().next();
        if next.is_some_and(|n| n.is_alphanumeric() || n == '_' || n == '"') {
            parts.push(&value[start..i]);
            start = i + 1;
        }
    }
    parts.push(&value[start..]);

    parts
}

/// Collect every item supplied for `key` across all of its instances.
///
/// Returns `None`, not an empty set, when nothing survives decoding so
/// callers can tell "absent" from "present but empty".
pub fn set_values(raw: &RawParams, key: &str) -> Option<BTreeSet<String>> {
    let values: BTreeSet<String> = raw
        .values(key)
        .flat_map(split_items)
        .map(|v| unquote_plus(v).trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();

    (!values.is_empty()).then_some(values)
}
