//! Per-request filter state.
//!
//! A [`RequestContext`] is built once per request from the request URI. It
//! decodes the query string, parses every filter, and answers the questions
//! a handler asks: typed argument values, the semantic filter dict, URLs for
//! links, whether to redirect, and how to consult the cache.

use rankdash_core::{ArgValue, RawParams, RequestArgs, Translate, ValidationError};
use rankdash_filters::{
    decode, set_values, unquote_plus, FilterContext, FilterOutput, FilterSet, ParseOptions,
    QueryRewriter, RewriteOptions,
};
use rankdash_storage::{CacheStore, JsonCache, Profiler, RequestCache};
use std::collections::BTreeSet;
use std::fmt;

use crate::config::WebConfig;
use crate::error::WebResult;

/// Argument carrying the per-request cache switch.
pub const CACHE_ARGUMENT: &str = "cache";

/// Argument carrying the sort order.
pub const ORDER_ARGUMENT: &str = "order";

const BOOLEAN_OPTIONS: [&str; 4] = ["0", "1", "false", "true"];

/// Sort direction requested with `order=asc|desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter state and argument access for one request.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    filters: &'a FilterSet,
    config: &'a WebConfig,
    uri: String,
    path: String,
    raw: RawParams,
    args: RequestArgs,
    redirect: bool,
}

impl<'a> RequestContext<'a> {
    /// Decode `uri` and parse every filter with default options.
    ///
    /// Fails with a 404-class error when any filter rejects its values.
    pub fn new(filters: &'a FilterSet, config: &'a WebConfig, uri: &str) -> WebResult<Self> {
        Self::with_options(filters, config, uri, &ParseOptions::default())
    }

    pub fn with_options(
        filters: &'a FilterSet,
        config: &'a WebConfig,
        uri: &str,
        options: &ParseOptions,
    ) -> WebResult<Self> {
        let raw = decode(uri);
        let parsed = filters.request_args(&raw, options)?;

        tracing::debug!(
            uri = %uri,
            redirect = parsed.redirect,
            "Parsed request filters"
        );

        Ok(Self {
            filters,
            config,
            uri: uri.to_string(),
            path: request_path(uri),
            raw,
            args: parsed.args,
            redirect: parsed.redirect,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The request path, without query string or fragment.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn raw_params(&self) -> &RawParams {
        &self.raw
    }

    pub fn filters(&self) -> &FilterSet {
        self.filters
    }

    /// Typed arguments of every filter plus any out-of-band arguments set
    /// with [`RequestContext::set_arg`].
    pub fn request_args(&self) -> &RequestArgs {
        &self.args
    }

    /// Record an out-of-band argument (sort order, page size) so generated
    /// URLs carry it.
    pub fn set_arg(&mut self, key: impl Into<String>, value: impl Into<ArgValue>) {
        self.args.insert(key.into(), value.into());
    }

    /// Whether parsing normalised the request.
    pub fn needs_redirect(&self) -> bool {
        self.redirect
    }

    // ========================================================================
    // Argument helpers
    // ========================================================================

    /// The last value of `name`, `+`-decoded and trimmed.
    pub fn get_argument(&self, name: &str) -> Option<String> {
        self.raw
            .last(name)
            .map(|value| unquote_plus(value).trim().to_string())
    }

    /// A non-negative integer. Absent or empty values are `None`.
    pub fn get_argument_uint(&self, name: &str) -> Result<Option<u64>, ValidationError> {
        let value = match self.get_argument(name) {
            Some(value) if !value.is_empty() => value,
            _ => return Ok(None),
        };

        match value.parse::<i64>() {
            Ok(n) if n < 0 => Err(invalid(
                name,
                &value,
                "must be greater than or equal to zero",
            )),
            Ok(n) => Ok(Some(n.unsigned_abs())),
            Err(_) => value
                .parse::<u64>()
                .map(Some)
                .map_err(|_| invalid(name, &value, "cannot be converted to an integer")),
        }
    }

    /// The last value of `name`, which must be one of `options`.
    pub fn get_argument_option(
        &self,
        name: &str,
        options: &[&str],
    ) -> Result<Option<String>, ValidationError> {
        match self.get_argument(name) {
            None => Ok(None),
            Some(value) if options.contains(&value.as_str()) => Ok(Some(value)),
            Some(value) => Err(invalid(
                name,
                &value,
                &format!("not in options (`{}`)", options.join(", ")),
            )),
        }
    }

    /// `0`, `1`, `false` or `true`.
    pub fn get_argument_boolean(&self, name: &str) -> Result<Option<bool>, ValidationError> {
        Ok(self
            .get_argument_option(name, &BOOLEAN_OPTIONS)?
            .map(|value| value == "1" || value == "true"))
    }

    /// Every item supplied for `name`. With `items` set, values outside it
    /// are rejected.
    pub fn get_argument_set(
        &self,
        name: &str,
        items: Option<&BTreeSet<String>>,
    ) -> Result<Option<BTreeSet<String>>, ValidationError> {
        let values = set_values(&self.raw, name);

        if let (Some(values), Some(items)) = (&values, items) {
            let invalid_values: Vec<&str> = values
                .difference(items)
                .map(String::as_str)
                .collect();
            if !invalid_values.is_empty() {
                return Err(invalid(
                    name,
                    &invalid_values.join(","),
                    "are not valid items",
                ));
            }
        }

        Ok(values)
    }

    pub fn get_argument_order(&self) -> Result<Option<SortOrder>, ValidationError> {
        Ok(self
            .get_argument_option(ORDER_ARGUMENT, &["asc", "desc"])?
            .map(|value| match value.as_str() {
                "asc" => SortOrder::Asc,
                _ => SortOrder::Desc,
            }))
    }

    // ========================================================================
    // Filters and URLs
    // ========================================================================

    /// Semantic expansion of the request arguments.
    pub fn filter_dict(&self, i18n: &dyn Translate) -> WebResult<FilterOutput> {
        Ok(self.filters.filter_dict(&self.args, &FilterContext::new(i18n))?)
    }

    /// URL builder for the current request.
    pub fn rewriter(&self) -> QueryRewriter<'a> {
        QueryRewriter::new(self.filters, self.config.url_root.clone(), self.path.clone())
    }

    /// A URL derived from the current request.
    pub fn query_rewrite(&self, options: &RewriteOptions<'_>) -> WebResult<String> {
        Ok(self.rewriter().rewrite(&self.args, options)?)
    }

    /// The canonical URL of this request.
    pub fn canonical_url(&self) -> WebResult<String> {
        Ok(self.rewriter().canonical(&self.args)?)
    }

    /// The canonical URL when parsing normalised the request.
    pub fn canonical_redirect(&self) -> WebResult<Option<String>> {
        if !self.redirect {
            return Ok(None);
        }

        let url = self.canonical_url()?;
        tracing::debug!(from = %self.uri, to = %url, "Redirecting to canonical URL");
        Ok(Some(url))
    }

    // ========================================================================
    // Cache
    // ========================================================================

    /// False when the request asked to bypass cache reads with `cache=0`.
    pub fn read_cache(&self) -> Result<bool, ValidationError> {
        Ok(self.get_argument_boolean(CACHE_ARGUMENT)? != Some(false))
    }

    /// Cache collaborators for this request.
    pub fn request_cache<'c, S: CacheStore>(
        &self,
        cache: &'c JsonCache<S>,
        profiler: &'c dyn Profiler,
    ) -> WebResult<RequestCache<'c, S>> {
        Ok(RequestCache::new(cache, profiler).with_read_cache(self.read_cache()?))
    }
}

fn invalid(name: &str, value: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidArgument {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn request_path(uri: &str) -> String {
    let end = uri.find(['?', '#']).unwrap_or(uri.len());
    let path = &uri[..end];
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use http::StatusCode;
    use rankdash_core::{FilterValue, NoTranslation};
    use rankdash_storage::{CacheAndProfile, ComputeOptions, InMemoryCacheStore, NoopProfiler};
    use rankdash_test_utils::fixtures;
    use rankdash_test_utils::RecordingObserver;
    use std::convert::Infallible;
    use std::sync::Arc;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn context<'a>(filters: &'a FilterSet, config: &'a WebConfig, uri: &str) -> RequestContext<'a> {
        RequestContext::new(filters, config, uri).unwrap()
    }

    #[test]
    fn test_path_strips_query_and_fragment() {
        assert_eq!(request_path("/rank?country=UK#top"), "/rank");
        assert_eq!(request_path("/rank#top"), "/rank");
        assert_eq!(request_path("?country=UK"), "/");
    }

    #[test]
    fn test_get_argument_takes_last_decoded_value() {
        let filters = fixtures::sample_filter_set();
        let config = WebConfig::default();
        let ctx = context(&filters, &config, "/rank?name=first&name=+second+value+");

        assert_eq!(ctx.get_argument("name").as_deref(), Some("second value"));
        assert_eq!(ctx.get_argument("missing"), None);
    }

    #[test]
    fn test_get_argument_uint() {
        let filters = fixtures::sample_filter_set();
        let config = WebConfig::default();

        let ctx = context(&filters, &config, "/rank?limit=25&page=");
        assert_eq!(ctx.get_argument_uint("limit").unwrap(), Some(25));
        assert_eq!(ctx.get_argument_uint("page").unwrap(), None);
        assert_eq!(ctx.get_argument_uint("offset").unwrap(), None);

        let ctx = context(&filters, &config, "/rank?limit=-1&page=ten");
        let negative = ctx.get_argument_uint("limit").unwrap_err();
        assert!(negative.to_string().contains("greater than or equal to zero"));
        let text = ctx.get_argument_uint("page").unwrap_err();
        assert!(text.to_string().contains("cannot be converted"));
    }

    #[test]
    fn test_get_argument_option_and_order() {
        let filters = fixtures::sample_filter_set();
        let config = WebConfig::default();

        let ctx = context(&filters, &config, "/rank?order=asc&view=map");
        assert_eq!(ctx.get_argument_order().unwrap(), Some(SortOrder::Asc));
        assert_eq!(
            ctx.get_argument_option("view", &["map", "table"]).unwrap(),
            Some("map".to_string())
        );

        let ctx = context(&filters, &config, "/rank?order=sideways");
        let err = ctx.get_argument_order().unwrap_err();
        assert_eq!(err.key(), "order");
        let web: crate::WebError = err.into();
        assert_eq!(web.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_get_argument_boolean() {
        let filters = fixtures::sample_filter_set();
        let config = WebConfig::default();

        let ctx = context(&filters, &config, "/rank?a=1&b=false&c=true&d=0&e=yes");
        assert_eq!(ctx.get_argument_boolean("a").unwrap(), Some(true));
        assert_eq!(ctx.get_argument_boolean("b").unwrap(), Some(false));
        assert_eq!(ctx.get_argument_boolean("c").unwrap(), Some(true));
        assert_eq!(ctx.get_argument_boolean("d").unwrap(), Some(false));
        assert_eq!(ctx.get_argument_boolean("missing").unwrap(), None);
        assert!(ctx.get_argument_boolean("e").is_err());
    }

    #[test]
    fn test_get_argument_set_verifies_items() {
        let filters = fixtures::sample_filter_set();
        let config = WebConfig::default();
        let ctx = context(&filters, &config, "/rank?tag=red,blue&tag=green");

        assert_eq!(
            ctx.get_argument_set("tag", None).unwrap(),
            Some(set(&["blue", "green", "red"]))
        );
        assert_eq!(ctx.get_argument_set("none", None).unwrap(), None);

        let allowed = set(&["red", "green"]);
        let err = ctx.get_argument_set("tag", Some(&allowed)).unwrap_err();
        assert!(err.to_string().contains("`blue`"));
    }

    #[test]
    fn test_unknown_filter_value_is_not_found() {
        let filters = fixtures::sample_filter_set();
        let config = WebConfig::default();

        let err = RequestContext::new(&filters, &config, "/rank?country=Atlantis").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFilters);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.message.contains("Atlantis"));
    }

    #[test]
    fn test_filter_dict_expands_groups() {
        let filters = fixtures::sample_filter_set();
        let config = WebConfig::default();
        let ctx = context(&filters, &config, "/rank?country=EU,UK");

        let output = ctx.filter_dict(&NoTranslation).unwrap();
        let expected: BTreeSet<Option<String>> = ["France", "Germany", "UK"]
            .into_iter()
            .map(|c| Some(c.to_string()))
            .collect();
        assert_eq!(output.filter_dict["country"], FilterValue::Items(expected));
    }

    #[test]
    fn test_canonical_redirect_only_when_normalised() {
        let filters = fixtures::sample_filter_set();
        let config = WebConfig {
            url_root: "/dash".to_string(),
            ..WebConfig::default()
        };

        let ctx = context(&filters, &config, "/rank?status=open,bogus");
        assert!(ctx.needs_redirect());
        assert_eq!(ctx.canonical_redirect().unwrap().as_deref(), Some("/dash/rank"));

        let ctx = context(&filters, &config, "/rank?status=closed");
        assert!(!ctx.needs_redirect());
        assert_eq!(ctx.canonical_redirect().unwrap(), None);
        assert_eq!(ctx.canonical_url().unwrap(), "/dash/rank?status=closed");
    }

    #[test]
    fn test_out_of_band_arguments_reach_urls() {
        let filters = fixtures::sample_filter_set();
        let config = WebConfig::default();
        let mut ctx = context(&filters, &config, "/rank?country=UK&order=desc");

        let order = ctx.get_argument_order().unwrap();
        ctx.set_arg(ORDER_ARGUMENT, order.map(|o| o.as_str()));

        assert_eq!(ctx.canonical_url().unwrap(), "/rank?country=UK&order=desc");
        assert_eq!(
            ctx.query_rewrite(&RewriteOptions::path("/map#chart")).unwrap(),
            "/map?country=UK&order=desc#chart"
        );
    }

    #[test]
    fn test_cache_argument_disables_reads_only() {
        let filters = fixtures::sample_filter_set();
        let config = WebConfig::default();
        let cache = JsonCache::new(Arc::new(InMemoryCacheStore::new()), config.cache_config());
        let observer = RecordingObserver::new();
        let op = CacheAndProfile::new("rank");

        let first = context(&filters, &config, "/rank?country=UK");
        let dict = first.filter_dict(&NoTranslation).unwrap().filter_dict;
        let env = first
            .request_cache(&cache, &NoopProfiler)
            .unwrap()
            .with_observer(&observer);
        let value: Option<u32> = op
            .run(&env, &dict, &ComputeOptions::new(), |_, _| Ok::<_, Infallible>(Some(1)))
            .unwrap();
        assert_eq!(value, Some(1));

        let bypass = context(&filters, &config, "/rank?country=UK&cache=0");
        assert!(!bypass.read_cache().unwrap());
        let env = bypass
            .request_cache(&cache, &NoopProfiler)
            .unwrap()
            .with_observer(&observer);
        let value: Option<u32> = op
            .run(&env, &dict, &ComputeOptions::new(), |_, _| Ok::<_, Infallible>(Some(2)))
            .unwrap();
        assert_eq!(value, Some(2));

        let cached = context(&filters, &config, "/rank?country=UK");
        let env = cached
            .request_cache(&cache, &NoopProfiler)
            .unwrap()
            .with_observer(&observer);
        let value: Option<u32> = op
            .run(&env, &dict, &ComputeOptions::new(), |_, _| Ok::<_, Infallible>(Some(3)))
            .unwrap();
        assert_eq!(value, Some(2));

        assert_eq!(observer.misses(), 2);
        assert_eq!(observer.hits(), 1);
    }
}
