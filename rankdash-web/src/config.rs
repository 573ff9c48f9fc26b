//! Runtime Configuration
//!
//! Settings for the request layer, loaded from environment variables with
//! defaults suitable for development.

use rankdash_storage::{CacheConfig, CACHE_TTL_LONG, CACHE_TTL_SHORT};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// WEB CONFIGURATION
// ============================================================================

/// Configuration for URL generation, caching and logging.
#[derive(Debug, Clone, PartialEq)]
pub struct WebConfig {
    // ========================================================================
    // URLs
    // ========================================================================
    /// Prefix prepended to every generated path. Empty when the dashboard
    /// is mounted at the site root.
    pub url_root: String,

    // ========================================================================
    // Cache
    // ========================================================================
    /// Global cache switch. Requests may additionally disable reads with
    /// the `cache` argument.
    pub cache_enabled: bool,

    /// TTL for ordinary results.
    pub cache_ttl_short: Duration,

    /// TTL for results marked valuable.
    pub cache_ttl_long: Duration,

    // ========================================================================
    // Filters
    // ========================================================================
    /// Filter configuration file (YAML, JSON or TOML).
    pub filters_path: Option<PathBuf>,

    // ========================================================================
    // Logging
    // ========================================================================
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset.
    pub log_directive: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub log_json: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            url_root: String::new(),
            cache_enabled: true,
            cache_ttl_short: CACHE_TTL_SHORT,
            cache_ttl_long: CACHE_TTL_LONG,
            filters_path: None,
            log_directive: "rankdash=info,info".to_string(),
            log_json: false,
        }
    }
}

impl WebConfig {
    /// Create WebConfig from environment variables.
    ///
    /// Environment variables:
    /// - `RANKDASH_URL_ROOT`: Prefix for generated paths (default: empty)
    /// - `RANKDASH_CACHE_ENABLED`: "true" or "false" (default: true)
    /// - `RANKDASH_CACHE_TTL_SHORT_SECS`: Ordinary TTL (default: one week)
    /// - `RANKDASH_CACHE_TTL_LONG_SECS`: Valuable TTL (default: thirty days)
    /// - `RANKDASH_FILTERS_PATH`: Filter configuration file (optional)
    /// - `RANKDASH_LOG`: Fallback log directive (default: "rankdash=info,info")
    /// - `RANKDASH_LOG_JSON`: "true" for JSON logs (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Unparseable values fall back
    /// to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let url_root = lookup("RANKDASH_URL_ROOT")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.url_root);

        let cache_enabled = lookup("RANKDASH_CACHE_ENABLED")
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(defaults.cache_enabled);

        let cache_ttl_short = lookup("RANKDASH_CACHE_TTL_SHORT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl_short);

        let cache_ttl_long = lookup("RANKDASH_CACHE_TTL_LONG_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl_long);

        let filters_path = lookup("RANKDASH_FILTERS_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let log_directive = lookup("RANKDASH_LOG")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.log_directive);

        let log_json = lookup("RANKDASH_LOG_JSON")
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(defaults.log_json);

        Self {
            url_root,
            cache_enabled,
            cache_ttl_short,
            cache_ttl_long,
            filters_path,
            log_directive,
            log_json,
        }
    }

    /// The storage-layer cache configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .with_short_ttl(self.cache_ttl_short)
            .with_long_ttl(self.cache_ttl_long)
            .with_enabled(self.cache_enabled)
    }
}

// ============================================================================
// TESTS
// ============================================================================
