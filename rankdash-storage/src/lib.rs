//! Rankdash Storage - Cache Keys and Read-Through Caching
//!
//! Defines the cache collaborator interface and the wrapper that memoizes
//! widget data computations keyed by filter state. The production key-value
//! store lives outside this workspace; [`InMemoryCacheStore`] serves tests
//! and single-process deployments.

pub mod cache;

pub use cache::{
    cache_join, hash_data, post_limit_items, CacheAndProfile, CacheConfig, CacheKeyBuilder,
    CacheLookup, CacheObserver, CacheStats, CacheStore, ComputeOptions, InMemoryCacheStore,
    JsonCache, KeyHook, LocaleKeyHook, NoopProfiler, PostLimit, Profiler, RequestCache,
    TracingProfiler, CACHE_TTL_LONG, CACHE_TTL_SHORT, DIGEST_LEN,
};
