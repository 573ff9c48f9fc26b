use once_cell::sync::Lazy;
use rankdash_core::{
    ArgValue, ConfigError, FilterDict, FilterValue, GroupLabel, GroupedSetConfig, RawParams,
    RequestArgs, RequestLabels, ValidationError,
};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use super::{Filter, FilterOutput, ParseOptions, ParsedArgs};
use crate::hooks::{
    FilterContext, GroupExpander, GroupTitle, HookRegistry, ItemGroup, Preverifier,
};
use crate::params::set_values;

static SEARCH_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^"(.*)"$"#).expect("valid regex"));

/// Set filter whose values may name groups of items, a null item or
/// quoted search terms.
///
/// Built once through [`GroupedSetBuilder`], which checks that items,
/// group names, extra keys and the null value never overlap.
#[derive(Clone)]
pub struct GroupedSetFilter {
    key: String,
    text: Option<String>,
    groups: BTreeMap<String, ItemGroup>,
    allow_search_text: bool,
    null_value: Option<String>,
    /// Every value the filter accepts. Empty disables membership checks.
    items_full: BTreeSet<String>,
    expander: Option<Arc<dyn GroupExpander>>,
    preverifier: Option<Arc<dyn Preverifier>>,
}

impl GroupedSetFilter {
    pub fn builder(key: impl Into<String>) -> GroupedSetBuilder {
        GroupedSetBuilder::new(key)
    }

    pub fn from_config(
        config: &GroupedSetConfig,
        hooks: &HookRegistry,
    ) -> Result<Self, ConfigError> {
        let mut builder = GroupedSetBuilder::new(&config.key)
            .extra_keys(config.groups_extra_keys.iter().cloned())
            .allow_search_text(config.allow_search_text)
            .placeholder_names(config.placeholder_names.iter().cloned());

        if let Some(text) = &config.text {
            builder = builder.text(text);
        }
        if let Some(items) = &config.items {
            builder = builder.items(items.iter().cloned());
        }
        if let Some(null_value) = &config.null_value {
            builder = builder.null_value(null_value);
        }

        for (name, group) in &config.groups {
            let mut item_group = ItemGroup::new(group.items.iter().cloned());
            item_group.title = match hooks.group_title(&config.key, name) {
                Some(provider) => Some(GroupTitle::Provided(provider)),
                None => group.title.clone().map(GroupTitle::Static),
            };
            builder = builder.group(name, item_group);
        }

        if let Some(expander) = hooks.expander(&config.key) {
            builder = builder.expander(expander);
        }
        if let Some(preverifier) = hooks.preverifier(&config.key) {
            builder = builder.preverifier(preverifier);
        }

        builder.build()
    }

    /// Every value accepted by membership checks.
    pub fn items_full(&self) -> &BTreeSet<String> {
        &self.items_full
    }

    pub fn null_value(&self) -> Option<&str> {
        self.null_value.as_deref()
    }

    pub fn allows_search_text(&self) -> bool {
        self.allow_search_text
    }

    /// Separate `"quoted"` search terms (returned unquoted) from exact
    /// values.
    pub fn split_exact_search(values: &BTreeSet<String>) -> (BTreeSet<String>, BTreeSet<String>) {
        let mut exact = BTreeSet::new();
        let mut search = BTreeSet::new();

        for value in values {
            match SEARCH_TEXT.captures(value).and_then(|c| c.get(1)) {
                Some(term) => search.insert(term.as_str().to_string()),
                None => exact.insert(value.clone()),
            };
        }

        (exact, search)
    }

    fn verify(&self, values: &BTreeSet<String>) -> Result<(), ValidationError> {
        if values.is_empty() || self.items_full.is_empty() {
            return Ok(());
        }

        let exact = if self.allow_search_text {
            Self::split_exact_search(values).0
        } else {
            values.clone()
        };

        let unrecognised: BTreeSet<String> =
            exact.difference(&self.items_full).cloned().collect();
        if unrecognised.is_empty() {
            return Ok(());
        }

        tracing::debug!(filter = %self.key, values = ?unrecognised, "Unrecognised filter values");
        Err(ValidationError::UnrecognizedValue {
            key: self.key.clone(),
            values: unrecognised,
        })
    }

    fn group(&self, value: &str, ctx: &FilterContext<'_>) -> Option<ItemGroup> {
        self.expander
            .as_ref()
            .and_then(|expander| expander.expand(value, ctx))
            .or_else(|| self.groups.get(value).cloned())
    }
}

impl fmt::Debug for GroupedSetFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupedSetFilter")
            .field("key", &self.key)
            .field("groups", &self.groups.keys().collect::<Vec<_>>())
            .field("allow_search_text", &self.allow_search_text)
            .field("null_value", &self.null_value)
            .field("items_full", &self.items_full.len())
            .field("expander", &self.expander.is_some())
            .field("preverifier", &self.preverifier.is_some())
            .finish()
    }
}

impl Filter for GroupedSetFilter {
    fn key(&self) -> &str {
        &self.key
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn request_args(
        &self,
        raw: &RawParams,
        _options: &ParseOptions,
    ) -> Result<ParsedArgs, ValidationError> {
        let mut args = RequestArgs::from([(
            self.key.clone(),
            ArgValue::from(set_values(raw, &self.key)),
        )]);

        let mut redirect = false;
        if let Some(preverifier) = &self.preverifier {
            redirect |= preverifier.preverify(&self.key, &mut args, raw);
        }

        if let Some(ArgValue::Set(values)) = args.get(&self.key) {
            self.verify(values)?;
        }

        Ok(ParsedArgs::new(args, redirect))
    }

    fn filter_dict(&self, args: &RequestArgs, ctx: &FilterContext<'_>) -> FilterOutput {
        let mut items = BTreeSet::new();
        let mut labels = BTreeSet::new();

        let values = args
            .get(&self.key)
            .map(ArgValue::query_values)
            .unwrap_or_default();

        for value in values {
            match self.group(&value, ctx) {
                Some(group) => {
                    items.extend(group.items.iter().cloned().map(Some));
                    let label = group
                        .title
                        .as_ref()
                        .map(|title| title.resolve(ctx.i18n))
                        .filter(|title| !title.is_empty())
                        .unwrap_or_else(|| value.clone());
                    labels.insert(GroupLabel::new(value, label, group.items));
                }
                None if self.null_value.as_deref() == Some(value.as_str()) => {
                    items.insert(None);
                }
                None => {
                    items.insert(Some(value));
                }
            }
        }

        let mut output = FilterOutput {
            filter_dict: FilterDict::from([(self.key.clone(), FilterValue::Items(items))]),
            labels: RequestLabels::new(),
            errors: Vec::new(),
        };
        if !labels.is_empty() {
            output.labels.insert(self.key.clone(), labels);
        }
        output
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Validating builder for [`GroupedSetFilter`].
pub struct GroupedSetBuilder {
    key: String,
    text: Option<String>,
    items: Option<BTreeSet<String>>,
    groups: BTreeMap<String, ItemGroup>,
    extra_keys: BTreeSet<String>,
    allow_search_text: bool,
    null_value: Option<String>,
    placeholder_names: BTreeSet<String>,
    expander: Option<Arc<dyn GroupExpander>>,
    preverifier: Option<Arc<dyn Preverifier>>,
}

impl GroupedSetBuilder {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: None,
            items: None,
            groups: BTreeMap::new(),
            extra_keys: BTreeSet::new(),
            allow_search_text: false,
            null_value: None,
            placeholder_names: BTreeSet::new(),
            expander: None,
            preverifier: None,
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = Some(items.into_iter().map(Into::into).collect());
        self
    }

    pub fn group(mut self, name: impl Into<String>, group: ItemGroup) -> Self {
        self.groups.insert(name.into(), group);
        self
    }

    /// Values expanded only by the expander hook.
    pub fn extra_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn allow_search_text(mut self, allow: bool) -> Self {
        self.allow_search_text = allow;
        self
    }

    pub fn null_value(mut self, value: impl Into<String>) -> Self {
        self.null_value = Some(value.into());
        self
    }

    pub fn placeholder_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.placeholder_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn expander(mut self, expander: Arc<dyn GroupExpander>) -> Self {
        self.expander = Some(expander);
        self
    }

    pub fn preverifier(mut self, preverifier: Arc<dyn Preverifier>) -> Self {
        self.preverifier = Some(preverifier);
        self
    }

    fn overlap(
        &self,
        accepted: &BTreeSet<String>,
        first: &str,
        second: &str,
        values: &BTreeSet<String>,
    ) -> Result<(), ConfigError> {
        let shared: BTreeSet<String> = accepted.intersection(values).cloned().collect();
        if shared.is_empty() {
            return Ok(());
        }
        Err(ConfigError::OverlappingValues {
            key: self.key.clone(),
            first: first.to_string(),
            second: second.to_string(),
            values: shared,
        })
    }

    pub fn build(self) -> Result<GroupedSetFilter, ConfigError> {
        let mut items_full = BTreeSet::new();

        if let Some(items) = &self.items {
            if items.contains("") {
                tracing::warn!(filter = %self.key, "Empty string among filter items");
            }
            items_full.extend(items.iter().cloned());
        }

        let group_names: BTreeSet<String> = self.groups.keys().cloned().collect();
        self.overlap(&items_full, "items", "groups", &group_names)?;
        items_full.extend(group_names);

        self.overlap(&items_full, "items and groups", "extra keys", &self.extra_keys)?;
        items_full.extend(self.extra_keys.iter().cloned());

        if let Some(null_value) = &self.null_value {
            let null_set = BTreeSet::from([null_value.clone()]);
            self.overlap(&items_full, "enumerated values", "null value", &null_set)?;
            items_full.insert(null_value.clone());
        }

        if let Some(items) = &self.items {
            let missing: BTreeSet<String> =
                self.placeholder_names.difference(items).cloned().collect();
            if !missing.is_empty() {
                return Err(ConfigError::UnknownPlaceholderNames {
                    key: self.key,
                    names: missing,
                });
            }
        }

        Ok(GroupedSetFilter {
            key: self.key,
            text: self.text,
            groups: self.groups,
            allow_search_text: self.allow_search_text,
            null_value: self.null_value,
            items_full,
            expander: self.expander,
            preverifier: self.preverifier,
        })
    }
}
