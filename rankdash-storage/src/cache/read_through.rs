//! Read-through caching and profiling of widget data computations.
//!
//! [`CacheAndProfile`] describes one cached operation (its name, key hook
//! and TTL tier). [`RequestCache`] carries the per-request collaborators.
//! Running an operation looks the key up, and on a miss computes inside a
//! profiling span and stores the result:
//!
//! ```ignore
//! let rank = CacheAndProfile::new("rank").valuable(true);
//! let data = rank.run(&env, &filter_dict, &options, |dict, params| {
//!     producer.rank(dict, params)
//! })?;
//! ```

use rankdash_core::FilterDict;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::json::JsonCache;
use super::key::CacheKeyBuilder;
use super::post_limit::{post_limit_items, PostLimit};
use super::profile::Profiler;
use super::traits::{CacheLookup, CacheStore};

/// Post-processes a computed cache key.
pub trait KeyHook: Send + Sync {
    fn rewrite_key(&self, filter_dict: &FilterDict, key: String) -> String;
}

/// Folds the active language into keys of translated results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleKeyHook {
    language: Option<String>,
}

impl LocaleKeyHook {
    pub fn new(language: Option<&str>) -> Self {
        Self {
            language: language.map(str::to_string),
        }
    }
}

impl KeyHook for LocaleKeyHook {
    fn rewrite_key(&self, _filter_dict: &FilterDict, key: String) -> String {
        match &self.language {
            Some(language) => format!("{}:{}", key, language),
            None => key,
        }
    }
}

/// Notified of cache outcomes for one request.
pub trait CacheObserver: Send + Sync {
    fn on_hit(&self, _key: &str) {}

    /// `reads_enabled` is false when the request bypassed cache reads.
    fn on_miss(&self, _key: &str, _reads_enabled: bool) {}
}

/// Options for one computation. `post_limit` is applied to the result and
/// never reaches the cache key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputeOptions {
    pub post_limit: Option<usize>,
    pub params: BTreeMap<String, Value>,
}

impl ComputeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_post_limit(mut self, limit: usize) -> Self {
        self.post_limit = Some(limit);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Per-request cache collaborators.
pub struct RequestCache<'a, S: CacheStore> {
    pub cache: &'a JsonCache<S>,
    pub profiler: &'a dyn Profiler,
    pub observer: Option<&'a dyn CacheObserver>,
    pub key_hook: Option<&'a dyn KeyHook>,
    /// Serve cached results. Results are stored either way.
    pub read_cache: bool,
}

impl<'a, S: CacheStore> RequestCache<'a, S> {
    pub fn new(cache: &'a JsonCache<S>, profiler: &'a dyn Profiler) -> Self {
        Self {
            cache,
            profiler,
            observer: None,
            key_hook: None,
            read_cache: true,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn CacheObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Hook applied to every key of this request, after the operation's
    /// own hook.
    pub fn with_key_hook(mut self, hook: &'a dyn KeyHook) -> Self {
        self.key_hook = Some(hook);
        self
    }

    pub fn with_read_cache(mut self, read_cache: bool) -> Self {
        self.read_cache = read_cache;
        self
    }
}

/// A named, cached and profiled computation.
#[derive(Clone)]
pub struct CacheAndProfile {
    name: String,
    key_hook: Option<Arc<dyn KeyHook>>,
    valuable: bool,
}

impl fmt::Debug for CacheAndProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheAndProfile")
            .field("name", &self.name)
            .field("key_hook", &self.key_hook.is_some())
            .field("valuable", &self.valuable)
            .finish()
    }
}

impl CacheAndProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_hook: None,
            valuable: false,
        }
    }

    pub fn with_key_hook(mut self, hook: Arc<dyn KeyHook>) -> Self {
        self.key_hook = Some(hook);
        self
    }

    /// Store results with the long TTL.
    pub fn valuable(mut self, valuable: bool) -> Self {
        self.valuable = valuable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key this operation uses for `filter_dict`, before any
    /// request-level hook.
    pub fn cache_key(&self, filter_dict: &FilterDict, params: &BTreeMap<String, Value>) -> String {
        let key = CacheKeyBuilder::build(&self.name, filter_dict, params);
        match &self.key_hook {
            Some(hook) => hook.rewrite_key(filter_dict, key),
            None => key,
        }
    }

    /// Return the cached result for `filter_dict`, or compute and store it.
    ///
    /// Cache failures never fail the call: a read error counts as a miss and
    /// a write error is logged. `post_limit` is ignored here; see
    /// [`CacheAndProfile::run_limited`].
    pub fn run<S, T, E, F>(
        &self,
        env: &RequestCache<'_, S>,
        filter_dict: &FilterDict,
        options: &ComputeOptions,
        compute: F,
    ) -> Result<Option<T>, E>
    where
        S: CacheStore,
        T: Serialize + DeserializeOwned,
        F: FnOnce(&FilterDict, &BTreeMap<String, Value>) -> Result<Option<T>, E>,
    {
        let mut key = self.cache_key(filter_dict, &options.params);
        if let Some(hook) = env.key_hook {
            key = hook.rewrite_key(filter_dict, key);
        }

        if env.read_cache {
            match env.cache.get_json::<T>(&key, false) {
                Ok(CacheLookup::Miss) => {}
                Ok(lookup) => {
                    tracing::debug!(operation = %self.name, cache_key = %key, "Cache hit");
                    if let Some(observer) = env.observer {
                        observer.on_hit(&key);
                    }
                    return Ok(lookup.into_option().flatten());
                }
                Err(e) => {
                    tracing::warn!(
                        operation = %self.name,
                        cache_key = %key,
                        error = %e,
                        "Cache read failed; recomputing"
                    );
                }
            }
        }

        tracing::debug!(
            operation = %self.name,
            cache_key = %key,
            read_cache = env.read_cache,
            "Cache miss"
        );
        if let Some(observer) = env.observer {
            observer.on_miss(&key, env.read_cache);
        }

        let result = {
            let span = tracing::debug_span!("compute", operation = %self.name);
            let _entered = span.enter();
            env.profiler.start(&self.name);
            let result = compute(filter_dict, &options.params);
            env.profiler.end(&self.name);
            result
        };
        let data = result?.filter(|value| !serializes_to_null(value));

        if let Err(e) = env.cache.set_json(&key, data.as_ref(), self.valuable, false) {
            tracing::warn!(
                operation = %self.name,
                cache_key = %key,
                error = %e,
                "Cache write failed"
            );
        }

        Ok(data)
    }

    /// [`CacheAndProfile::run`], then truncate the result to
    /// `options.post_limit`.
    pub fn run_limited<S, T, E, F>(
        &self,
        env: &RequestCache<'_, S>,
        filter_dict: &FilterDict,
        options: &ComputeOptions,
        compute: F,
    ) -> Result<Option<T>, E>
    where
        S: CacheStore,
        T: Serialize + DeserializeOwned + PostLimit,
        F: FnOnce(&FilterDict, &BTreeMap<String, Value>) -> Result<Option<T>, E>,
    {
        let data = self.run(env, filter_dict, options, compute)?;
        Ok(data.map(|value| post_limit_items(value, options.post_limit)))
    }
}

/// A value whose JSON form is `null` reads back as a null result, so it is
/// returned as one from the start.
fn serializes_to_null<T: Serialize>(value: &T) -> bool {
    matches!(serde_json::to_value(value), Ok(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::json::CacheConfig;
    use crate::cache::memory::InMemoryCacheStore;
    use crate::cache::profile::{NoopProfiler, TracingProfiler};
    use rankdash_core::{CacheError, FilterValue};
    use serde_json::json;
    use std::cell::Cell;
    use std::convert::Infallible;
    use std::sync::Mutex;
    use std::time::Duration;

    fn dict() -> FilterDict {
        FilterDict::from([("country".to_string(), FilterValue::items(["UK"]))])
    }

    fn cache() -> JsonCache<InMemoryCacheStore> {
        JsonCache::with_defaults(Arc::new(InMemoryCacheStore::new()))
    }

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<String>>,
    }

    impl CacheObserver for Recording {
        fn on_hit(&self, _key: &str) {
            self.events.lock().unwrap().push("hit".to_string());
        }

        fn on_miss(&self, _key: &str, reads_enabled: bool) {
            self.events
                .lock()
                .unwrap()
                .push(format!("miss:{}", reads_enabled));
        }
    }

    #[test]
    fn test_second_call_is_served_from_cache() {
        let cache = cache();
        let profiler = TracingProfiler::new();
        let observer = Recording::default();
        let env = RequestCache::new(&cache, &profiler).with_observer(&observer);
        let op = CacheAndProfile::new("rank");
        let calls = Cell::new(0);

        for _ in 0..2 {
            let data = op
                .run(&env, &dict(), &ComputeOptions::new(), |_, _| {
                    calls.set(calls.get() + 1);
                    Ok::<_, Infallible>(Some(json!({"items": ["UK"]})))
                })
                .unwrap();
            assert_eq!(data, Some(json!({"items": ["UK"]})));
        }

        assert_eq!(calls.get(), 1);
        assert_eq!(profiler.timings().len(), 1);
        assert_eq!(*observer.events.lock().unwrap(), vec!["miss:true", "hit"]);
    }

    #[test]
    fn test_null_result_is_cached() {
        let cache = cache();
        let env = RequestCache::new(&cache, &NoopProfiler);
        let op = CacheAndProfile::new("rank");
        let calls = Cell::new(0);

        for _ in 0..2 {
            let data: Option<Value> = op
                .run(&env, &dict(), &ComputeOptions::new(), |_, _| {
                    calls.set(calls.get() + 1);
                    Ok::<_, Infallible>(None)
                })
                .unwrap();
            assert_eq!(data, None);
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_json_null_value_is_a_null_result() {
        let cache = cache();
        let env = RequestCache::new(&cache, &NoopProfiler);
        let op = CacheAndProfile::new("rank");
        let calls = Cell::new(0);

        for _ in 0..2 {
            let data: Option<Value> = op
                .run(&env, &dict(), &ComputeOptions::new(), |_, _| {
                    calls.set(calls.get() + 1);
                    Ok::<_, Infallible>(Some(Value::Null))
                })
                .unwrap();
            assert_eq!(data, None);
        }
        assert_eq!(calls.get(), 1);

        let unit: Option<()> = CacheAndProfile::new("unit")
            .run(&env, &dict(), &ComputeOptions::new(), |_, _| Ok::<_, Infallible>(Some(())))
            .unwrap();
        assert_eq!(unit, None);
    }

    #[test]
    fn test_read_bypass_still_stores() {
        let cache = cache();
        let observer = Recording::default();
        let bypass = RequestCache::new(&cache, &NoopProfiler)
            .with_observer(&observer)
            .with_read_cache(false);
        let op = CacheAndProfile::new("rank");

        let first = op
            .run(&bypass, &dict(), &ComputeOptions::new(), |_, _| Ok::<_, Infallible>(Some(1u32)))
            .unwrap();
        let second = op
            .run(&bypass, &dict(), &ComputeOptions::new(), |_, _| Ok::<_, Infallible>(Some(2u32)))
            .unwrap();
        assert_eq!((first, second), (Some(1), Some(2)));
        assert_eq!(*observer.events.lock().unwrap(), vec!["miss:false", "miss:false"]);

        let normal = RequestCache::new(&cache, &NoopProfiler);
        let cached = op
            .run(&normal, &dict(), &ComputeOptions::new(), |_, _| Ok::<_, Infallible>(Some(3u32)))
            .unwrap();
        assert_eq!(cached, Some(2));
    }

    #[test]
    fn test_post_limit_excluded_from_key() {
        let cache = cache();
        let env = RequestCache::new(&cache, &NoopProfiler);
        let op = CacheAndProfile::new("rank");
        let full = || Ok::<_, Infallible>(Some(vec![1, 2, 3]));

        let limited = op
            .run_limited(&env, &dict(), &ComputeOptions::new().with_post_limit(2), |_, _| full())
            .unwrap();
        assert_eq!(limited, Some(vec![1, 2]));

        let unlimited = op
            .run_limited(&env, &dict(), &ComputeOptions::new(), |_, _| {
                Ok::<_, Infallible>(Some(vec![9]))
            })
            .unwrap();
        assert_eq!(unlimited, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_params_and_hooks_change_key() {
        let op = CacheAndProfile::new("rank");
        let plain = op.cache_key(&dict(), &BTreeMap::new());
        let paged = op.cache_key(&dict(), &ComputeOptions::new().with_param("page", 2).params);
        assert_ne!(plain, paged);

        let localised = CacheAndProfile::new("rank")
            .with_key_hook(Arc::new(LocaleKeyHook::new(Some("fr"))));
        assert_eq!(localised.cache_key(&dict(), &BTreeMap::new()), format!("{}:fr", plain));
        assert_eq!(
            LocaleKeyHook::new(None).rewrite_key(&dict(), plain.clone()),
            plain
        );
    }

    #[test]
    fn test_compute_error_is_not_cached() {
        let cache = cache();
        let env = RequestCache::new(&cache, &NoopProfiler);
        let op = CacheAndProfile::new("rank");

        let failed: Result<Option<u32>, &str> =
            op.run(&env, &dict(), &ComputeOptions::new(), |_, _| Err("backend down"));
        assert_eq!(failed, Err("backend down"));

        let retried = op
            .run(&env, &dict(), &ComputeOptions::new(), |_, _| Ok::<_, &str>(Some(5u32)))
            .unwrap();
        assert_eq!(retried, Some(5));
    }

    struct FailingStore;

    impl CacheStore for FailingStore {
        fn get_item(&self, _key: &str, _accept_old: bool) -> Result<Option<String>, CacheError> {
            Err(CacheError::Backend {
                reason: "unreachable".to_string(),
            })
        }

        fn set_item(
            &self,
            _key: &str,
            _value: &str,
            _ttl: Duration,
            _expired: bool,
        ) -> Result<bool, CacheError> {
            Err(CacheError::Backend {
                reason: "unreachable".to_string(),
            })
        }
    }

    #[test]
    fn test_store_failure_degrades_to_recompute() {
        let cache = JsonCache::new(Arc::new(FailingStore), CacheConfig::new());
        let env = RequestCache::new(&cache, &NoopProfiler);
        let op = CacheAndProfile::new("rank");
        let calls = Cell::new(0);

        for _ in 0..2 {
            let data = op
                .run(&env, &dict(), &ComputeOptions::new(), |_, _| {
                    calls.set(calls.get() + 1);
                    Ok::<_, Infallible>(Some(7u32))
                })
                .unwrap();
            assert_eq!(data, Some(7));
        }
        assert_eq!(calls.get(), 2);
    }
}
