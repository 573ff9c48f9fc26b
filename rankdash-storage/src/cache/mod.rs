//! Cache layer for computed widget data.
//!
//! Results are memoized under keys derived from the semantic filter dict,
//! so two URLs that select the same items share one entry.
//!
//! # Null results
//!
//! The external store cannot tell an absent key from a stored null. The
//! JSON layer writes a null result as JSON `null` and reads it back as
//! [`CacheLookup::HitNull`], distinct from [`CacheLookup::Miss`].
//!
//! # Failure policy
//!
//! The cache is best-effort. [`CacheAndProfile`] treats store failures as
//! misses and recomputes.

pub mod json;
pub mod key;
pub mod memory;
pub mod post_limit;
pub mod profile;
pub mod read_through;
pub mod traits;

pub use json::{CacheConfig, JsonCache, CACHE_TTL_LONG, CACHE_TTL_SHORT};
pub use key::{cache_join, hash_data, CacheKeyBuilder, DIGEST_LEN};
pub use memory::InMemoryCacheStore;
pub use post_limit::{post_limit_items, PostLimit};
pub use profile::{NoopProfiler, Profiler, TracingProfiler};
pub use read_through::{
    CacheAndProfile, CacheObserver, ComputeOptions, KeyHook, LocaleKeyHook, RequestCache,
};
pub use traits::{CacheLookup, CacheStats, CacheStore};
