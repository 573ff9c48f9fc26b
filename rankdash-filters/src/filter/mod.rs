//! The `Filter` capability set and its variants.

use rankdash_core::{
    ArgValue, FilterDict, FilterValue, RawParams, RequestArgs, RequestLabels, ValidationError,
};
use std::collections::BTreeSet;
use std::fmt;

use crate::codec::quote_key_values;
use crate::hooks::FilterContext;

mod grouped;
mod partition;
mod text;

pub use grouped::{GroupedSetBuilder, GroupedSetFilter};
pub use partition::{PartitionFilter, PartitionItem, ALL};
pub use text::TextFilter;

/// Caller switches for [`Filter::request_args`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Partition filters fall back to "no restriction" instead of their
    /// configured default when the request does not mention them.
    pub default_all: bool,
}

/// Typed arguments parsed from one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    pub args: RequestArgs,
    /// Parsing normalised the input; the caller should redirect to the
    /// canonical URL.
    pub redirect: bool,
}

impl ParsedArgs {
    pub fn new(args: RequestArgs, redirect: bool) -> Self {
        Self { args, redirect }
    }

    pub fn merge(&mut self, other: ParsedArgs) {
        self.args.extend(other.args);
        self.redirect |= other.redirect;
    }
}

/// Semantic expansion of request arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutput {
    pub filter_dict: FilterDict,
    pub labels: RequestLabels,
    pub errors: Vec<ValidationError>,
}

impl FilterOutput {
    pub fn merge(&mut self, other: FilterOutput) {
        self.filter_dict.extend(other.filter_dict);
        for (key, labels) in other.labels {
            self.labels.entry(key).or_default().extend(labels);
        }
        self.errors.extend(other.errors);
    }
}

/// One named filter of a resource.
pub trait Filter: Send + Sync + fmt::Debug {
    fn key(&self) -> &str;

    /// Display text.
    fn text(&self) -> Option<&str> {
        None
    }

    /// Every request key this filter owns.
    fn keys(&self) -> BTreeSet<String> {
        self.default_request_args().into_keys().collect()
    }

    fn default_request_args(&self) -> RequestArgs {
        RequestArgs::from([(self.key().to_string(), ArgValue::Null)])
    }

    fn request_args(
        &self,
        raw: &RawParams,
        options: &ParseOptions,
    ) -> Result<ParsedArgs, ValidationError>;

    /// Semantic value of this filter. Defaults to passing the argument
    /// through unchanged.
    fn filter_dict(&self, args: &RequestArgs, _ctx: &FilterContext<'_>) -> FilterOutput {
        let value = args
            .get(self.key())
            .map(FilterValue::from)
            .unwrap_or(FilterValue::Null);

        FilterOutput {
            filter_dict: FilterDict::from([(self.key().to_string(), value)]),
            ..FilterOutput::default()
        }
    }

    /// URL-encoded `key=value` fragments. Nothing for an empty value.
    fn query_params(&self, args: &RequestArgs) -> Vec<String> {
        let values = args
            .get(self.key())
            .filter(|v| !v.is_empty())
            .map(ArgValue::query_values)
            .unwrap_or_default();

        if values.is_empty() {
            return Vec::new();
        }
        vec![quote_key_values(self.key(), values.iter().map(String::as_str))]
    }
}
