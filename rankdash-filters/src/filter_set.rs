//! Ordered composition of a resource's filters.

use rankdash_core::{
    ArgValue, ConfigError, FilterConfig, FilterSetConfig, FiltersError, RawParams, RequestArgs,
};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::filter::{
    Filter, FilterOutput, GroupedSetFilter, ParseOptions, ParsedArgs, PartitionFilter, TextFilter,
};
use crate::hooks::{FilterContext, HookRegistry};

/// Every filter of one resource, in declaration order.
///
/// Filter keys are unique across the set, so merging per-filter results
/// never overwrites.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterSet {
    pub fn new(filters: Vec<Arc<dyn Filter>>) -> Result<Self, ConfigError> {
        let mut seen = BTreeSet::new();
        for filter in &filters {
            for key in filter.keys() {
                if !seen.insert(key.clone()) {
                    return Err(ConfigError::DuplicateFilterKey { key });
                }
            }
        }

        Ok(Self { filters })
    }

    /// Build every filter of a configuration, injecting hooks by key.
    pub fn from_config(config: &FilterSetConfig, hooks: &HookRegistry) -> Result<Self, ConfigError> {
        let filters = config
            .filters
            .iter()
            .map(|filter| -> Result<Arc<dyn Filter>, ConfigError> {
                let built: Arc<dyn Filter> = match filter {
                    FilterConfig::Text(c) => Arc::new(TextFilter::from_config(c)),
                    FilterConfig::GroupedSet(c) => Arc::new(GroupedSetFilter::from_config(c, hooks)?),
                    FilterConfig::Partition(c) => Arc::new(PartitionFilter::from_config(c)?),
                };
                Ok(built)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(filters)
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn Filter>> {
        self.filters.iter().find(|filter| filter.key() == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Filter>> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Union of every member's keys.
    pub fn keys(&self) -> BTreeSet<String> {
        self.filters.iter().flat_map(|filter| filter.keys()).collect()
    }

    pub fn default_request_args(&self) -> RequestArgs {
        self.filters
            .iter()
            .flat_map(|filter| filter.default_request_args())
            .collect()
    }

    /// Parse every filter. A filter that rejects its input contributes
    /// null arguments to the partial result, so every key stays covered.
    pub fn request_args(
        &self,
        raw: &RawParams,
        options: &ParseOptions,
    ) -> Result<ParsedArgs, FiltersError<ParsedArgs>> {
        let mut parsed = ParsedArgs::default();
        let mut errors = Vec::new();

        for filter in &self.filters {
            match filter.request_args(raw, options) {
                Ok(args) => parsed.merge(args),
                Err(error) => {
                    parsed
                        .args
                        .extend(filter.keys().into_iter().map(|key| (key, ArgValue::Null)));
                    errors.push(error);
                }
            }
        }

        if parsed.redirect {
            tracing::debug!("Filter arguments normalised; redirect requested");
        }

        if errors.is_empty() {
            Ok(parsed)
        } else {
            Err(FiltersError::new(errors, parsed))
        }
    }

    pub fn filter_dict(
        &self,
        args: &RequestArgs,
        ctx: &FilterContext<'_>,
    ) -> Result<FilterOutput, FiltersError<FilterOutput>> {
        let mut output = FilterOutput::default();
        for filter in &self.filters {
            output.merge(filter.filter_dict(args, ctx));
        }

        if output.errors.is_empty() {
            Ok(output)
        } else {
            Err(FiltersError::new(output.errors.clone(), output))
        }
    }

    /// Query fragments of every filter, in declaration order.
    pub fn query_params(&self, args: &RequestArgs) -> Vec<String> {
        self.filters
            .iter()
            .flat_map(|filter| filter.query_params(args))
            .collect()
    }
}
