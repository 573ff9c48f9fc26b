//! In-memory TTL cache store.

use chrono::{DateTime, Utc};
use rankdash_core::CacheError;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use super::traits::{CacheStats, CacheStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Process-local [`CacheStore`] with TTL expiry and statistics.
///
/// Expired entries stay in memory, readable with `accept_old`, until
/// [`InMemoryCacheStore::purge_expired`] or an overwrite removes them.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, Entry>>,
    stats: RwLock<CacheStats>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) -> Result<(), CacheError> {
        let mut stats = self.stats.write().map_err(|_| CacheError::LockPoisoned)?;
        update(&mut stats);
        Ok(())
    }

    /// Remove one entry. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> Result<bool, CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        Ok(entries.remove(key).is_some())
    }

    /// Remove every entry whose key starts with `prefix`, e.g. one cache
    /// namespace. Returns the number removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    /// Drop expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> Result<u64, CacheError> {
        let now = Utc::now();
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        Ok((before - entries.len()) as u64)
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        self.entries
            .write()
            .map_err(|_| CacheError::LockPoisoned)?
            .clear();
        Ok(())
    }

    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self
            .entries
            .read()
            .map_err(|_| CacheError::LockPoisoned)?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let mut stats = self
            .stats
            .read()
            .map_err(|_| CacheError::LockPoisoned)?
            .clone();
        stats.entry_count = self.len()? as u64;
        Ok(stats)
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get_item(&self, key: &str, accept_old: bool) -> Result<Option<String>, CacheError> {
        let now = Utc::now();
        let found = {
            let entries = self.entries.read().map_err(|_| CacheError::LockPoisoned)?;
            entries
                .get(key)
                .filter(|entry| accept_old || entry.is_fresh(now))
                .map(|entry| (entry.value.clone(), entry.is_fresh(now)))
        };

        match &found {
            Some((_, true)) => self.record(|s| s.hits += 1)?,
            Some((_, false)) => self.record(|s| {
                s.hits += 1;
                s.stale_hits += 1;
            })?,
            None => self.record(|s| s.misses += 1)?,
        }

        Ok(found.map(|(value, _)| value))
    }

    fn set_item(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
        expired: bool,
    ) -> Result<bool, CacheError> {
        let now = Utc::now();
        let expires_at = if expired {
            now - chrono::Duration::seconds(1)
        } else {
            let ttl = chrono::Duration::from_std(ttl).map_err(|e| CacheError::Backend {
                reason: format!("TTL out of range: {}", e),
            })?;
            now + ttl
        };

        self.entries
            .write()
            .map_err(|_| CacheError::LockPoisoned)?
            .insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at,
                },
            );
        self.record(|s| s.writes += 1)?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    #[test]
    fn test_set_then_get() {
        let store = InMemoryCacheStore::new();
        assert!(store.set_item("k", "v", WEEK, false).unwrap());
        assert_eq!(store.get_item("k", false).unwrap().as_deref(), Some("v"));
        assert_eq!(store.get_item("missing", false).unwrap(), None);

        let stats = store.stats().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[test]
    fn test_expired_entries_need_accept_old() {
        let store = InMemoryCacheStore::new();
        store.set_item("stale", "v", WEEK, true).unwrap();
        assert_eq!(store.get_item("stale", false).unwrap(), None);
        assert_eq!(store.get_item("stale", true).unwrap().as_deref(), Some("v"));
        assert_eq!(store.stats().unwrap().stale_hits, 1);

        store.set_item("zero", "v", Duration::ZERO, false).unwrap();
        assert_eq!(store.get_item("zero", false).unwrap(), None);
    }

    #[test]
    fn test_invalidation() {
        let store = InMemoryCacheStore::new();
        store.set_item("rank:a", "1", WEEK, false).unwrap();
        store.set_item("rank:b", "2", WEEK, false).unwrap();
        store.set_item("chart:a", "3", WEEK, false).unwrap();

        assert!(store.invalidate("rank:a").unwrap());
        assert!(!store.invalidate("rank:a").unwrap());
        assert_eq!(store.invalidate_prefix("rank:").unwrap(), 1);
        assert_eq!(store.len().unwrap(), 1);

        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_purge_expired() {
        let store = InMemoryCacheStore::new();
        store.set_item("old", "1", WEEK, true).unwrap();
        store.set_item("new", "2", WEEK, false).unwrap();
        assert_eq!(store.purge_expired().unwrap(), 1);
        assert_eq!(store.get_item("new", false).unwrap().as_deref(), Some("2"));
    }
}
