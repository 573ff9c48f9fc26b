//! Rankdash Core - Filter State Types
//!
//! Pure data structures shared by every rankdash crate. A request's filter
//! state moves through three shapes:
//!
//! ```text
//! query string ─► RawParams ─► RequestArgs ─► FilterDict
//!                  (decoded     (typed, one     (semantic: groups
//!                   keys)        per filter)     expanded, null item)
//! ```
//!
//! This crate holds those shapes, the error taxonomy, the static
//! configuration types and a few text helpers. It contains no filter logic.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub mod config;
pub mod error;
pub mod format;
pub mod i18n;

pub use config::*;
pub use error::*;
pub use format::{format_i18n, format_title_bold_only, format_title_plain, prune};
pub use i18n::{MessageCatalog, NoTranslation, Translate};

// ============================================================================
// RAW PARAMETERS
// ============================================================================

/// Query-string parameters for one request.
///
/// Keys are fully decoded. Values are kept in their partially encoded form
/// (`+` has not been turned into a space) so each filter can apply its own
/// decoding. Repeated keys accumulate in order; a part without `=` is
/// recorded as a presence-only `None` instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    params: BTreeMap<String, Vec<Option<String>>>,
}

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one instance of `key`.
    pub fn push(&mut self, key: impl Into<String>, value: Option<String>) {
        self.params.entry(key.into()).or_default().push(value);
    }

    /// All instances supplied for `key`, in order. Empty when absent.
    pub fn get(&self, key: &str) -> &[Option<String>] {
        self.params.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Instances of `key` that carried a value (presence-only flags skipped).
    pub fn values<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.get(key).iter().filter_map(|v| v.as_deref())
    }

    /// The last instance of `key`, if it carried a value.
    pub fn last(&self, key: &str) -> Option<&str> {
        self.get(key).last().and_then(|v| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Option<String>])> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for RawParams {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut params = RawParams::new();
        for (key, value) in iter {
            params.push(key, value);
        }
        params
    }
}

// ============================================================================
// REQUEST ARGUMENTS
// ============================================================================

/// A typed request argument.
///
/// `Set` is ordered so serialisation is deterministic. For partition
/// filters an empty `Set` means "no restriction".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Null,
    Text(String),
    Uint(u64),
    Bool(bool),
    Set(BTreeSet<String>),
}

impl ArgValue {
    /// Build a set value from any string iterator.
    pub fn set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ArgValue::Set(values.into_iter().map(Into::into).collect())
    }

    pub fn text(value: impl Into<String>) -> Self {
        ArgValue::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ArgValue::Null)
    }

    /// Null, an empty string or an empty set.
    pub fn is_empty(&self) -> bool {
        match self {
            ArgValue::Null => true,
            ArgValue::Text(s) => s.is_empty(),
            ArgValue::Set(s) => s.is_empty(),
            ArgValue::Uint(_) | ArgValue::Bool(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            ArgValue::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            ArgValue::Uint(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The unencoded strings this value contributes to a query string.
    /// Scalars become a single element; null contributes nothing.
    pub fn query_values(&self) -> Vec<String> {
        match self {
            ArgValue::Null => Vec::new(),
            ArgValue::Text(s) => vec![s.clone()],
            ArgValue::Uint(n) => vec![n.to_string()],
            ArgValue::Bool(b) => vec![b.to_string()],
            ArgValue::Set(s) => s.iter().cloned().collect(),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Text(value)
    }
}

impl From<u64> for ArgValue {
    fn from(value: u64) -> Self {
        ArgValue::Uint(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<BTreeSet<String>> for ArgValue {
    fn from(value: BTreeSet<String>) -> Self {
        ArgValue::Set(value)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ArgValue::Null)
    }
}

/// Typed arguments keyed by filter key, plus any out-of-band keys such as
/// sort order or pagination.
pub type RequestArgs = BTreeMap<String, ArgValue>;

// ============================================================================
// FILTER DICT
// ============================================================================

/// The semantic value of a filter, as consumed by data producers.
///
/// `Items` holds item identifiers with groups already expanded; `None`
/// stands for the configured null item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Text(String),
    Uint(u64),
    Bool(bool),
    Items(BTreeSet<Option<String>>),
}

impl FilterValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FilterValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_items(&self) -> Option<&BTreeSet<Option<String>>> {
        match self {
            FilterValue::Items(items) => Some(items),
            _ => None,
        }
    }

    /// Build an item set from identifiers that are all non-null.
    pub fn items<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::Items(values.into_iter().map(|v| Some(v.into())).collect())
    }
}

impl From<&ArgValue> for FilterValue {
    fn from(value: &ArgValue) -> Self {
        match value {
            ArgValue::Null => FilterValue::Null,
            ArgValue::Text(s) => FilterValue::Text(s.clone()),
            ArgValue::Uint(n) => FilterValue::Uint(*n),
            ArgValue::Bool(b) => FilterValue::Bool(*b),
            ArgValue::Set(s) => FilterValue::Items(s.iter().cloned().map(Some).collect()),
        }
    }
}

/// Semantic filter values keyed by filter key.
pub type FilterDict = BTreeMap<String, FilterValue>;

/// Display label for a selected value that names an expandable group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupLabel {
    /// The selected value, as it appears in the query string.
    pub value: String,
    /// Group title, possibly translated.
    pub label: String,
    /// Member items the value expanded to.
    pub items: Vec<String>,
}

impl GroupLabel {
    pub fn new(value: impl Into<String>, label: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            items,
        }
    }
}

/// Group labels keyed by filter key. Only grouped filters contribute.
pub type RequestLabels = BTreeMap<String, BTreeSet<GroupLabel>>;

// ============================================================================
// TESTS
// ============================================================================
