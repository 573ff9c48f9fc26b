//! Rankdash Test Utilities
//!
//! Shared test infrastructure for the rankdash workspace:
//! - Proptest generators for filter arguments
//! - Fixtures for a sample filter set and its configuration
//! - Recording and failing doubles for the cache collaborators

pub use rankdash_core::{
    ArgValue, ConfigError, FilterDict, FilterSetConfig, FilterValue, RawParams, RequestArgs,
    ValidationError,
};
pub use rankdash_filters::{FilterSet, GroupedSetFilter, PartitionFilter, TextFilter};
pub use rankdash_storage::{CacheObserver, CacheStore, InMemoryCacheStore, JsonCache, Profiler};

use rankdash_core::CacheError;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for request arguments of the sample filter set.

    use super::fixtures::{COUNTRIES, STATUSES};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    /// Free-form item identifiers: words with inner spaces and non-ASCII
    /// letters. Commas and `+` are excluded because the item splitter
    /// treats them as syntax.
    pub fn arb_item() -> impl Strategy<Value = String> {
        "[A-Za-zé][A-Za-z0-9é ]{0,10}[A-Za-z0-9é]"
    }

    pub fn arb_items() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set(arb_item(), 1..6)
    }

    /// A non-empty selection of sample countries.
    pub fn arb_countries() -> impl Strategy<Value = BTreeSet<String>> {
        prop::sample::subsequence(COUNTRIES.to_vec(), 1..=COUNTRIES.len())
            .prop_map(|keys| keys.into_iter().map(str::to_string).collect())
    }

    /// Any selection of sample statuses, including none and all.
    pub fn arb_statuses() -> impl Strategy<Value = BTreeSet<String>> {
        prop::sample::subsequence(STATUSES.to_vec(), 0..=STATUSES.len())
            .prop_map(|keys| keys.into_iter().map(str::to_string).collect())
    }

    /// Search text that survives trimming.
    pub fn arb_search_text() -> impl Strategy<Value = String> {
        "[a-z0-9][a-z0-9 &=%]{0,12}[a-z0-9]"
    }

    /// Arbitrary query strings, including malformed escapes.
    pub fn arb_query_string() -> impl Strategy<Value = String> {
        "[a-z=&;%+,A-F0-9]{0,40}"
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! A small dashboard: free-text search, countries with an EU group and
    //! an "unknown" null item, and a status partition defaulting to open.

    use super::*;
    use rankdash_filters::{ItemGroup, PartitionItem};
    use std::sync::Arc;

    pub const COUNTRIES: [&str; 5] = ["Brazil", "France", "Germany", "Palestine, State of", "UK"];
    pub const STATUSES: [&str; 3] = ["archived", "closed", "open"];

    pub fn search_filter() -> TextFilter {
        TextFilter::new("q").with_text("Search").with_codec_plus(true)
    }

    pub fn country_filter() -> GroupedSetFilter {
        GroupedSetFilter::builder("country")
            .text("Country")
            .items(COUNTRIES)
            .group(
                "EU",
                ItemGroup::new(["France", "Germany"]).with_title("European Union"),
            )
            .null_value("unknown")
            .build()
            .expect("valid country filter")
    }

    pub fn status_filter() -> PartitionFilter {
        PartitionFilter::new(
            "status",
            vec![
                PartitionItem::new("open", true).with_label("Open"),
                PartitionItem::new("closed", false).with_label("Closed"),
                PartitionItem::new("archived", false).with_label("Archived"),
            ],
        )
        .expect("valid status filter")
    }

    pub fn sample_filter_set() -> FilterSet {
        FilterSet::new(vec![
            Arc::new(search_filter()),
            Arc::new(country_filter()),
            Arc::new(status_filter()),
        ])
        .expect("unique filter keys")
    }

    /// The YAML configuration equivalent to [`sample_filter_set`].
    pub const SAMPLE_CONFIG_YAML: &str = r#"
filters:
  - type: text
    key: q
    text: Search
    codecPlus: true
  - type: grouped_set
    key: country
    text: Country
    items: [Brazil, France, Germany, "Palestine, State of", UK]
    groups:
      EU:
        items: [France, Germany]
        title: European Union
    nullValue: unknown
  - type: partition
    key: status
    items:
      - key: open
        label: Open
        defaultValue: true
      - key: closed
        label: Closed
      - key: archived
        label: Archived
"#;

    pub fn sample_config() -> FilterSetConfig {
        FilterSetConfig::from_yaml_str(SAMPLE_CONFIG_YAML).expect("valid sample configuration")
    }
}

// ============================================================================
// DOUBLES
// ============================================================================

/// Records profiler notifications in order, as `start:name` / `end:name`.
#[derive(Debug, Default)]
pub struct RecordingProfiler {
    events: Mutex<Vec<String>>,
}

impl RecordingProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn record(&self, event: String) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Profiler for RecordingProfiler {
    fn start(&self, name: &str) {
        self.record(format!("start:{name}"));
    }

    fn end(&self, name: &str) {
        self.record(format!("end:{name}"));
    }
}

/// A cache outcome seen by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Hit(String),
    Miss { key: String, reads_enabled: bool },
}

/// Records cache hits and misses.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<CacheEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CacheEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn hits(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, CacheEvent::Hit(_)))
            .count()
    }

    pub fn misses(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, CacheEvent::Miss { .. }))
            .count()
    }

    fn record(&self, event: CacheEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl CacheObserver for RecordingObserver {
    fn on_hit(&self, key: &str) {
        self.record(CacheEvent::Hit(key.to_string()));
    }

    fn on_miss(&self, key: &str, reads_enabled: bool) {
        self.record(CacheEvent::Miss {
            key: key.to_string(),
            reads_enabled,
        });
    }
}

/// A store whose every operation fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

impl CacheStore for FailingStore {
    fn get_item(&self, _key: &str, _accept_old: bool) -> Result<Option<String>, CacheError> {
        Err(CacheError::Backend {
            reason: "store offline".to_string(),
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
            reason: "store offline".to_string(),
        })
    }
}

/// Counts invocations of a computation.
#[derive(Debug, Default)]
pub struct CallCounter {
    calls: Mutex<usize>,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or_default()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rankdash_filters::HookRegistry;

    #[test]
    fn test_sample_config_matches_fixture() {
        let from_config =
            FilterSet::from_config(&fixtures::sample_config(), &HookRegistry::new()).unwrap();
        let fixture = fixtures::sample_filter_set();

        assert_eq!(from_config.keys(), fixture.keys());
        assert_eq!(
            from_config.default_request_args(),
            fixture.default_request_args()
        );
    }

    #[test]
    fn test_recording_profiler_orders_events() {
        let profiler = RecordingProfiler::new();
        profiler.start("rank");
        profiler.end("rank");
        assert_eq!(profiler.events(), vec!["start:rank", "end:rank"]);
    }

    #[test]
    fn test_failing_store_fails() {
        assert!(FailingStore.get_item("k", false).is_err());
        assert!(FailingStore.set_item("k", "1", Duration::from_secs(1), false).is_err());
    }
}
