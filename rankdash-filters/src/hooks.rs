//! Strategy seams injected into filters at construction.
//!
//! Configuration files only carry static data. Anything computed per
//! request (dynamic group expansion, argument pre-verification, translated
//! group titles, per-key URL rewriting) is supplied as a trait object
//! through a [`HookRegistry`].

use rankdash_core::{NoTranslation, RawParams, RequestArgs, Translate};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

static NO_TRANSLATION: NoTranslation = NoTranslation;

/// Per-request context handed to filters while building a filter dict.
#[derive(Clone, Copy)]
pub struct FilterContext<'a> {
    pub i18n: &'a dyn Translate,
}

impl<'a> FilterContext<'a> {
    pub fn new(i18n: &'a dyn Translate) -> Self {
        Self { i18n }
    }

    /// Context whose translator returns messages unchanged.
    pub fn untranslated() -> FilterContext<'static> {
        FilterContext {
            i18n: &NO_TRANSLATION,
        }
    }
}

impl fmt::Debug for FilterContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterContext")
            .field("language", &self.i18n.language())
            .finish()
    }
}

/// Computes a group title for the active language.
pub trait LabelProvider: Send + Sync {
    fn label(&self, i18n: &dyn Translate) -> String;
}

impl<F> LabelProvider for F
where
    F: Fn(&dyn Translate) -> String + Send + Sync,
{
    fn label(&self, i18n: &dyn Translate) -> String {
        self(i18n)
    }
}

/// Title of an item group: fixed text or computed per request.
#[derive(Clone)]
pub enum GroupTitle {
    Static(String),
    Provided(Arc<dyn LabelProvider>),
}

impl GroupTitle {
    pub fn resolve(&self, i18n: &dyn Translate) -> String {
        match self {
            GroupTitle::Static(title) => title.clone(),
            GroupTitle::Provided(provider) => provider.label(i18n),
        }
    }
}

impl fmt::Debug for GroupTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupTitle::Static(title) => f.debug_tuple("Static").field(title).finish(),
            GroupTitle::Provided(_) => f.write_str("Provided(..)"),
        }
    }
}

/// A named set of items selectable by one value.
#[derive(Debug, Clone)]
pub struct ItemGroup {
    pub items: Vec<String>,
    pub title: Option<GroupTitle>,
}

impl ItemGroup {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(GroupTitle::Static(title.into()));
        self
    }

    pub fn with_title_provider(mut self, provider: Arc<dyn LabelProvider>) -> Self {
        self.title = Some(GroupTitle::Provided(provider));
        self
    }
}

/// Expands a selected value into a group at request time. Consulted
/// before the static group table; `None` falls through to it.
pub trait GroupExpander: Send + Sync {
    fn expand(&self, value: &str, ctx: &FilterContext<'_>) -> Option<ItemGroup>;
}

impl<F> GroupExpander for F
where
    F: Fn(&str, &FilterContext<'_>) -> Option<ItemGroup> + Send + Sync,
{
    fn expand(&self, value: &str, ctx: &FilterContext<'_>) -> Option<ItemGroup> {
        self(value, ctx)
    }
}

/// Inspects and may rewrite a filter's parsed arguments before membership
/// checks. Returns `true` when the request should be redirected to its
/// canonical URL.
pub trait Preverifier: Send + Sync {
    fn preverify(&self, key: &str, args: &mut RequestArgs, raw: &RawParams) -> bool;
}

impl<F> Preverifier for F
where
    F: Fn(&str, &mut RequestArgs, &RawParams) -> bool + Send + Sync,
{
    fn preverify(&self, key: &str, args: &mut RequestArgs, raw: &RawParams) -> bool {
        self(key, args, raw)
    }
}

/// Transforms the values of an out-of-band key while building a URL.
/// `None` leaves the values unchanged.
pub trait RewriteHook: Send + Sync {
    fn rewrite_key(&self, key: &str, values: &[String]) -> Option<Vec<String>>;
}

impl<F> RewriteHook for F
where
    F: Fn(&str, &[String]) -> Option<Vec<String>> + Send + Sync,
{
    fn rewrite_key(&self, key: &str, values: &[String]) -> Option<Vec<String>> {
        self(key, values)
    }
}

/// Hooks keyed by filter key (and group, for titles).
#[derive(Clone, Default)]
pub struct HookRegistry {
    expanders: HashMap<String, Arc<dyn GroupExpander>>,
    preverifiers: HashMap<String, Arc<dyn Preverifier>>,
    group_titles: HashMap<(String, String), Arc<dyn LabelProvider>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expander(mut self, key: impl Into<String>, expander: Arc<dyn GroupExpander>) -> Self {
        self.expanders.insert(key.into(), expander);
        self
    }

    pub fn with_preverifier(
        mut self,
        key: impl Into<String>,
        preverifier: Arc<dyn Preverifier>,
    ) -> Self {
        self.preverifiers.insert(key.into(), preverifier);
        self
    }

    pub fn with_group_title(
        mut self,
        key: impl Into<String>,
        group: impl Into<String>,
        provider: Arc<dyn LabelProvider>,
    ) -> Self {
        self.group_titles.insert((key.into(), group.into()), provider);
        self
    }

    pub fn expander(&self, key: &str) -> Option<Arc<dyn GroupExpander>> {
        self.expanders.get(key).cloned()
    }

    pub fn preverifier(&self, key: &str) -> Option<Arc<dyn Preverifier>> {
        self.preverifiers.get(key).cloned()
    }

    pub fn group_title(&self, key: &str, group: &str) -> Option<Arc<dyn LabelProvider>> {
        self.group_titles
            .get(&(key.to_string(), group.to_string()))
            .cloned()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("expanders", &self.expanders.keys().collect::<Vec<_>>())
            .field("preverifiers", &self.preverifiers.keys().collect::<Vec<_>>())
            .field("group_titles", &self.group_titles.keys().collect::<Vec<_>>())
            .finish()
    }
}
