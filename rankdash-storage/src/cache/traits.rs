//! Cache store collaborator traits.
//!
//! The store is an external key-value service with a blocking interface.
//! It cannot tell an absent key from a stored null; [`CacheLookup`] makes
//! that distinction at the JSON layer.

use rankdash_core::CacheError;
use std::sync::Arc;
use std::time::Duration;

/// Key-value cache collaborator.
///
/// Implementations should be thread-safe. Concurrent writers of the same key
/// are allowed; the last write wins.
pub trait CacheStore: Send + Sync {
    /// Fetch a value. Expired entries are returned only when `accept_old`
    /// is set.
    fn get_item(&self, key: &str, accept_old: bool) -> Result<Option<String>, CacheError>;

    /// Store a value for `ttl`. With `expired` set the entry is written
    /// already stale, readable only with `accept_old`.
    ///
    /// Returns whether the store accepted the write.
    fn set_item(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
        expired: bool,
    ) -> Result<bool, CacheError>;
}

impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    fn get_item(&self, key: &str, accept_old: bool) -> Result<Option<String>, CacheError> {
        (**self).get_item(key, accept_old)
    }

    fn set_item(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
        expired: bool,
    ) -> Result<bool, CacheError> {
        (**self).set_item(key, value, ttl, expired)
    }
}

/// Outcome of a typed cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    /// A value was cached.
    Hit(T),
    /// A null result was cached.
    HitNull,
    /// Nothing usable was cached.
    Miss,
}

impl<T> CacheLookup<T> {
    pub fn is_hit(&self) -> bool {
        !matches!(self, CacheLookup::Miss)
    }

    /// `None` on a miss, otherwise the cached (possibly null) result.
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            CacheLookup::Hit(value) => Some(Some(value)),
            CacheLookup::HitNull => Some(None),
            CacheLookup::Miss => None,
        }
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hits served from expired entries.
    pub stale_hits: u64,
    /// Number of writes accepted.
    pub writes: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
