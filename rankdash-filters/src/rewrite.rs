//! Canonical URL construction from request arguments.

use once_cell::sync::Lazy;
use rankdash_core::{ArgValue, PathError, RequestArgs};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use crate::codec::quote_key_values;
use crate::filter_set::FilterSet;
use crate::hooks::RewriteHook;

static SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid regex"));

/// Per-call options of [`QueryRewriter::rewrite`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteOptions<'a> {
    /// Bare absolute path, optionally with a `#fragment`. `None` keeps the
    /// current request path.
    pub path: Option<&'a str>,
    /// Values replacing those of the same keys in the working arguments.
    pub query: Option<&'a RequestArgs>,
    /// Start from the default arguments instead of the current ones.
    pub replace_query: bool,
}

impl<'a> RewriteOptions<'a> {
    pub fn path(path: &'a str) -> Self {
        Self {
            path: Some(path),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: &'a RequestArgs) -> Self {
        self.query = Some(query);
        self
    }

    pub fn replacing_query(mut self) -> Self {
        self.replace_query = true;
        self
    }
}

/// Maps request arguments back to a canonical URL.
///
/// Output is deterministic: filters serialise in declaration order, then
/// the remaining keys in key order.
#[derive(Clone)]
pub struct QueryRewriter<'a> {
    filters: &'a FilterSet,
    url_root: String,
    current_path: String,
    extra_defaults: RequestArgs,
    hook: Option<Arc<dyn RewriteHook>>,
}

impl<'a> QueryRewriter<'a> {
    pub fn new(
        filters: &'a FilterSet,
        url_root: impl Into<String>,
        current_path: impl Into<String>,
    ) -> Self {
        Self {
            filters,
            url_root: url_root.into(),
            current_path: current_path.into(),
            extra_defaults: RequestArgs::new(),
            hook: None,
        }
    }

    /// Defaults for out-of-band keys such as sort order or page size.
    pub fn with_extra_defaults(mut self, defaults: RequestArgs) -> Self {
        self.extra_defaults = defaults;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn RewriteHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Filter defaults plus the out-of-band defaults.
    pub fn default_args(&self) -> RequestArgs {
        let mut args = self.extra_defaults.clone();
        args.extend(self.filters.default_request_args());
        args
    }

    /// The canonical URL of the current resource for `current`.
    pub fn canonical(&self, current: &RequestArgs) -> Result<String, PathError> {
        self.rewrite(current, &RewriteOptions::default())
    }

    pub fn rewrite(
        &self,
        current: &RequestArgs,
        options: &RewriteOptions<'_>,
    ) -> Result<String, PathError> {
        let (path, fragment) = match options.path {
            Some(path) => split_path(path)?,
            None => (self.current_path.as_str(), None),
        };

        let mut args = if options.replace_query {
            self.default_args()
        } else {
            current.clone()
        };

        if let Some(query) = options.query {
            for (key, value) in args.iter_mut() {
                if let Some(replacement) = query.get(key) {
                    *value = replacement.clone();
                }
            }
        }

        let mut parts = self.filters.query_params(&args);
        let filter_keys = self.filters.keys();

        for (key, value) in &args {
            if filter_keys.contains(key) {
                continue;
            }
            if let Some(part) = self.serialize_key(key, value) {
                parts.push(part);
            }
        }

        let mut url = format!("{}{}", self.url_root, path);
        if url.len() > 1 && url.ends_with('/') {
            url.pop();
        }
        if !parts.is_empty() {
            url.push('?');
            url.push_str(&parts.join("&"));
        }
        if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
            url.push('#');
            url.push_str(fragment);
        }

        Ok(url)
    }

    fn serialize_key(&self, key: &str, value: &ArgValue) -> Option<String> {
        if value.is_empty() {
            return None;
        }

        let mut values = value.query_values();
        if let Some(hook) = &self.hook {
            if let Some(rewritten) = hook.rewrite_key(key, &values) {
                values = rewritten;
            }
        }
        if values.is_empty() {
            return None;
        }

        Some(quote_key_values(key, values.iter().map(String::as_str)))
    }
}

impl fmt::Debug for QueryRewriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryRewriter")
            .field("filters", &self.filters.len())
            .field("url_root", &self.url_root)
            .field("current_path", &self.current_path)
            .field("extra_defaults", &self.extra_defaults)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Validate a bare path and split off its fragment.
fn split_path(path: &str) -> Result<(&str, Option<&str>), PathError> {
    let error_path = || path.to_string();

    if path.contains('?') {
        return Err(PathError::ContainsQuery { path: error_path() });
    }
    if path.starts_with("//") || SCHEME.is_match(path) {
        return Err(PathError::Absolute { path: error_path() });
    }

    let (bare, fragment) = match path.split_once('#') {
        Some((bare, fragment)) => (bare, Some(fragment)),
        None => (path, None),
    };

    if bare.contains(';') {
        return Err(PathError::ContainsParams { path: error_path() });
    }
    if !bare.starts_with('/') {
        return Err(PathError::NotRooted { path: error_path() });
    }

    Ok((bare, fragment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, GroupedSetFilter, ParseOptions, PartitionFilter, PartitionItem};
    use crate::params::decode;

    fn filters() -> FilterSet {
        FilterSet::new(vec![
            Arc::new(
                GroupedSetFilter::builder("country")
                    .items(["UK", "France"])
                    .build()
                    .unwrap(),
            ) as Arc<dyn Filter>,
            Arc::new(
                PartitionFilter::new(
                    "status",
                    vec![PartitionItem::new("open", true), PartitionItem::new("closed", false)],
                )
                .unwrap(),
            ),
        ])
        .unwrap()
    }

    fn current(filters: &FilterSet) -> RequestArgs {
        let mut args = filters.default_request_args();
        args.insert("sort".to_string(), ArgValue::text("desc"));
        args.insert("limit".to_string(), ArgValue::Uint(20));
        args
    }

    #[test]
    fn test_defaults_produce_bare_path() {
        let filters = filters();
        let rewriter = QueryRewriter::new(&filters, "", "/rank/");
        assert_eq!(
            rewriter.canonical(&filters.default_request_args()).unwrap(),
            "/rank"
        );
    }

    #[test]
    fn test_filters_first_then_remaining_keys() {
        let filters = filters();
        let mut args = current(&filters);
        args.insert("country".to_string(), ArgValue::set(["UK", "France"]));

        let rewriter = QueryRewriter::new(&filters, "https://dash.example", "/rank");
        assert_eq!(
            rewriter.canonical(&args).unwrap(),
            "https://dash.example/rank?country=France,UK&limit=20&sort=desc"
        );
    }

    #[test]
    fn test_override_only_touches_known_keys() {
        let filters = filters();
        let args = current(&filters);
        let query = RequestArgs::from([
            ("sort".to_string(), ArgValue::text("asc")),
            ("page".to_string(), ArgValue::Uint(2)),
            ("status".to_string(), ArgValue::set(["closed"])),
        ]);

        let rewriter = QueryRewriter::new(&filters, "", "/rank");
        let url = rewriter
            .rewrite(&args, &RewriteOptions::default().with_query(&query))
            .unwrap();
        assert_eq!(url, "/rank?status=closed&limit=20&sort=asc");
    }

    #[test]
    fn test_replace_query_starts_from_defaults() {
        let filters = filters();
        let mut args = current(&filters);
        args.insert("country".to_string(), ArgValue::set(["UK"]));

        let rewriter = QueryRewriter::new(&filters, "", "/rank").with_extra_defaults(
            RequestArgs::from([("sort".to_string(), ArgValue::text("desc"))]),
        );
        let url = rewriter
            .rewrite(&args, &RewriteOptions::path("/chart#top").replacing_query())
            .unwrap();
        assert_eq!(url, "/chart?sort=desc#top");
    }

    #[test]
    fn test_empty_values_skipped() {
        let filters = filters();
        let mut args = filters.default_request_args();
        args.insert("tags".to_string(), ArgValue::Set(Default::default()));
        args.insert("note".to_string(), ArgValue::text(""));
        args.insert("flag".to_string(), ArgValue::Null);

        let rewriter = QueryRewriter::new(&filters, "", "/rank");
        assert_eq!(rewriter.canonical(&args).unwrap(), "/rank");
    }

    #[test]
    fn test_hook_rewrites_values() {
        struct Upper;
        impl RewriteHook for Upper {
            fn rewrite_key(&self, key: &str, values: &[String]) -> Option<Vec<String>> {
                (key == "sort").then(|| values.iter().map(|v| v.to_uppercase()).collect())
            }
        }

        let filters = filters();
        let rewriter = QueryRewriter::new(&filters, "", "/rank").with_hook(Arc::new(Upper));
        let url = rewriter.canonical(&current(&filters)).unwrap();
        assert_eq!(url, "/rank?limit=20&sort=DESC");
    }

    #[test]
    fn test_path_validation() {
        let filters = filters();
        let rewriter = QueryRewriter::new(&filters, "", "/rank");
        let args = filters.default_request_args();

        let check = |path: &str| rewriter.rewrite(&args, &RewriteOptions::path(path));
        assert!(matches!(check("/rank?x=1"), Err(PathError::ContainsQuery { .. })));
        assert!(matches!(check("https://evil/rank"), Err(PathError::Absolute { .. })));
        assert!(matches!(check("//evil/rank"), Err(PathError::Absolute { .. })));
        assert!(matches!(check("/rank;v=1"), Err(PathError::ContainsParams { .. })));
        assert!(matches!(check("rank"), Err(PathError::NotRooted { .. })));
        assert!(matches!(check(""), Err(PathError::NotRooted { .. })));
        assert_eq!(check("/").unwrap(), "/");

        let missing = rewriter.rewrite(&RequestArgs::new(), &RewriteOptions::path("/"));
        assert_eq!(missing.unwrap(), "/?status=all");
    }

    #[test]
    fn test_round_trip() {
        let filters = filters();
        let mut args = filters.default_request_args();
        args.insert("country".to_string(), ArgValue::set(["UK", "France"]));
        args.insert("status".to_string(), ArgValue::set(["closed"]));

        let url = QueryRewriter::new(&filters, "", "/rank").canonical(&args).unwrap();
        let parsed = filters
            .request_args(&decode(&url), &ParseOptions::default())
            .unwrap();
        assert_eq!(parsed.args, args);
        assert!(!parsed.redirect);
    }
}
