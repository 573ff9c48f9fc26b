//! Truncation applied after a cached computation.
//!
//! Caches are keyed on the full, unlimited result; a request's limit is
//! applied to the value returned from the cache.

use serde_json::Value;

/// A result whose item list can be truncated.
pub trait PostLimit {
    fn post_limit(self, limit: usize) -> Self;
}

impl<T> PostLimit for Vec<T> {
    fn post_limit(mut self, limit: usize) -> Self {
        self.truncate(limit);
        self
    }
}

/// Truncates the `items` array of a JSON object. Other values pass through.
impl PostLimit for Value {
    fn post_limit(mut self, limit: usize) -> Self {
        if let Some(Value::Array(items)) = self.get_mut("items") {
            items.truncate(limit);
        }
        self
    }
}

/// Apply an optional limit.
pub fn post_limit_items<T: PostLimit>(value: T, limit: Option<usize>) -> T {
    match limit {
        Some(limit) => value.post_limit(limit),
        None => value,
    }
}
