//! Typed JSON layer over a [`CacheStore`].

use rankdash_core::CacheError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::traits::{CacheLookup, CacheStore};

/// One week.
pub const CACHE_TTL_SHORT: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// Thirty days.
pub const CACHE_TTL_LONG: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Configuration for the JSON cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL for ordinary results.
    pub ttl_short: Duration,
    /// TTL for results marked valuable (expensive to recompute).
    pub ttl_long: Duration,
    /// When disabled, reads always miss and writes are skipped.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_short: CACHE_TTL_SHORT,
            ttl_long: CACHE_TTL_LONG,
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_short_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_short = ttl;
        self
    }

    pub fn with_long_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_long = ttl;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn ttl(&self, valuable: bool) -> Duration {
        if valuable {
            self.ttl_long
        } else {
            self.ttl_short
        }
    }
}

/// Stores JSON text in a [`CacheStore`], encoding a null result as JSON
/// `null` so it can be told apart from an absent key.
#[derive(Debug)]
pub struct JsonCache<S: CacheStore> {
    store: Arc<S>,
    config: CacheConfig,
}

impl<S: CacheStore> Clone for JsonCache<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: CacheStore> JsonCache<S> {
    pub fn new(store: Arc<S>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get_json<T: DeserializeOwned>(
        &self,
        key: &str,
        accept_old: bool,
    ) -> Result<CacheLookup<T>, CacheError> {
        if !self.config.enabled {
            return Ok(CacheLookup::Miss);
        }

        let Some(text) = self.store.get_item(key, accept_old)? else {
            return Ok(CacheLookup::Miss);
        };

        let value: Value = serde_json::from_str(&text).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        if value.is_null() {
            return Ok(CacheLookup::HitNull);
        }

        serde_json::from_value(value)
            .map(CacheLookup::Hit)
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })
    }

    /// Store `value`, or a null marker for `None`. A value whose JSON form
    /// is `null` is indistinguishable from the marker. Valuable results get
    /// the long TTL.
    pub fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: Option<&T>,
        valuable: bool,
        expired: bool,
    ) -> Result<bool, CacheError> {
        if !self.config.enabled {
            return Ok(false);
        }

        let text = serde_json::to_string(&value).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        self.store
            .set_item(key, &text, self.config.ttl(valuable), expired)
    }
}
