use rankdash_core::{
    ArgValue, ConfigError, PartitionConfig, RawParams, RequestArgs, ValidationError,
};
use std::collections::BTreeSet;

use super::{Filter, ParseOptions, ParsedArgs};
use crate::codec::{quote_key_values, quote_plus, unquote_plus};

/// Reserved value selecting every item of a partition.
pub const ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionItem {
    pub key: String,
    pub label: Option<String>,
    pub default_value: bool,
}

impl PartitionItem {
    pub fn new(key: impl Into<String>, default_value: bool) -> Self {
        Self {
            key: key.into(),
            label: None,
            default_value,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// "All or a subset" selector over a closed enumeration.
///
/// The argument is always a set. An empty set means no restriction; a
/// request selecting every item is normalised to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionFilter {
    key: String,
    text: Option<String>,
    items: Vec<PartitionItem>,
    all_value: BTreeSet<String>,
    /// Items selected when the request names none. A configuration with
    /// no default items defaults to every item.
    default_value: BTreeSet<String>,
}

impl PartitionFilter {
    pub fn new(key: impl Into<String>, items: Vec<PartitionItem>) -> Result<Self, ConfigError> {
        let key = key.into();

        if let Some(item) = items.iter().find(|item| item.key == ALL) {
            return Err(ConfigError::ReservedItemKey {
                key,
                item: item.key.clone(),
            });
        }

        let all_value: BTreeSet<String> = items.iter().map(|item| item.key.clone()).collect();
        if all_value.len() != items.len() {
            tracing::warn!(filter = %key, "Partition declares an item more than once");
        }

        let mut default_value: BTreeSet<String> = items
            .iter()
            .filter(|item| item.default_value)
            .map(|item| item.key.clone())
            .collect();
        if default_value.is_empty() {
            default_value = all_value.clone();
        }

        Ok(Self {
            key,
            text: None,
            items,
            all_value,
            default_value,
        })
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn from_config(config: &PartitionConfig) -> Result<Self, ConfigError> {
        let items = config
            .items
            .iter()
            .map(|item| PartitionItem {
                key: item.key.clone(),
                label: item.label.clone(),
                default_value: item.default_value,
            })
            .collect();

        let filter = Self::new(&config.key, items)?;
        Ok(match &config.text {
            Some(text) => filter.with_text(text),
            None => filter,
        })
    }

    pub fn items(&self) -> &[PartitionItem] {
        &self.items
    }

    pub fn all_value(&self) -> &BTreeSet<String> {
        &self.all_value
    }

    pub fn default_value(&self) -> &BTreeSet<String> {
        &self.default_value
    }

    /// Collapse a selection of every item to the empty "no restriction" set.
    fn normalise(&self, values: BTreeSet<String>) -> BTreeSet<String> {
        if values == self.all_value {
            BTreeSet::new()
        } else {
            values
        }
    }

    /// Every comma-separated value across all instances of the key.
    fn partition_values(raw: &RawParams, key: &str) -> BTreeSet<String> {
        raw.values(key)
            .map(unquote_plus)
            .flat_map(|value| {
                value
                    .split(',')
                    .map(|v| v.trim().to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// The selection an argument stands for, with "no restriction"
    /// expanded to every item.
    fn effective_value(&self, args: &RequestArgs) -> BTreeSet<String> {
        match args.get(&self.key) {
            Some(ArgValue::Set(values)) if !values.is_empty() => values.clone(),
            _ => self.all_value.clone(),
        }
    }
}

impl Filter for PartitionFilter {
    fn key(&self) -> &str {
        &self.key
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn default_request_args(&self) -> RequestArgs {
        RequestArgs::from([(
            self.key.clone(),
            ArgValue::Set(self.normalise(self.default_value.clone())),
        )])
    }

    fn request_args(
        &self,
        raw: &RawParams,
        options: &ParseOptions,
    ) -> Result<ParsedArgs, ValidationError> {
        let values = Self::partition_values(raw, &self.key);
        let mut redirect = false;

        let selected = if values.contains(ALL) {
            BTreeSet::new()
        } else if values.is_empty() {
            if options.default_all {
                BTreeSet::new()
            } else {
                self.normalise(self.default_value.clone())
            }
        } else {
            let valid: BTreeSet<String> = values.intersection(&self.all_value).cloned().collect();
            if valid.len() != values.len() {
                tracing::debug!(
                    filter = %self.key,
                    dropped = values.len() - valid.len(),
                    "Dropped unrecognised partition values"
                );
                redirect = true;
            }
            self.normalise(valid)
        };

        Ok(ParsedArgs::new(
            RequestArgs::from([(self.key.clone(), ArgValue::Set(selected))]),
            redirect,
        ))
    }

    fn query_params(&self, args: &RequestArgs) -> Vec<String> {
        let value = self.effective_value(args);

        if value == self.default_value {
            return Vec::new();
        }
        if value == self.all_value {
            return vec![format!("{}={}", quote_plus(&self.key), ALL)];
        }

        vec![quote_key_values(
            &self.key,
            value.iter().map(String::as_str).filter(|v| !v.is_empty()),
        )]
    }
}
