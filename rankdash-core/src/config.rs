//! Static filter configuration.
//!
//! These types are what a dashboard's configuration file deserialises into.
//! They carry no behaviour; `rankdash-filters` validates them into filters.
//! Field names follow the dashboard's camelCase vocabulary so existing
//! configuration files load unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::ConfigError;

/// One filter declaration, tagged by variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterConfig {
    Text(TextFilterConfig),
    GroupedSet(GroupedSetConfig),
    Partition(PartitionConfig),
}

impl FilterConfig {
    pub fn key(&self) -> &str {
        match self {
            FilterConfig::Text(c) => &c.key,
            FilterConfig::GroupedSet(c) => &c.key,
            FilterConfig::Partition(c) => &c.key,
        }
    }
}

/// Free-text filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFilterConfig {
    pub key: String,
    #[serde(default)]
    pub text: Option<String>,
    /// Treat a literal `+` in the raw value as a space.
    #[serde(default)]
    pub codec_plus: bool,
}

/// A named group of items selectable by a single value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub items: Vec<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Set filter over an optional enumeration of items and named groups.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedSetConfig {
    pub key: String,
    #[serde(default)]
    pub text: Option<String>,
    /// Valid item identifiers. `None` disables membership checking unless
    /// groups or extra keys are configured.
    #[serde(default)]
    pub items: Option<Vec<String>>,
    #[serde(default)]
    pub groups: BTreeMap<String, GroupConfig>,
    /// Values accepted by the filter that are expanded by a hook rather
    /// than the static group table.
    #[serde(default, alias = "groups_extra_keys")]
    pub groups_extra_keys: Vec<String>,
    /// Accept `"quoted"` values as search terms without membership checks.
    #[serde(default)]
    pub allow_search_text: bool,
    /// Value that stands for the null item.
    #[serde(default)]
    pub null_value: Option<String>,
    #[serde(default)]
    pub placeholder_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionItemConfig {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub default_value: bool,
}

/// "All or a subset" selector over a closed enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionConfig {
    pub key: String,
    #[serde(default)]
    pub text: Option<String>,
    pub items: Vec<PartitionItemConfig>,
}

/// Every filter of one resource, in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterSetConfig {
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
}

impl FilterSetConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(source).map_err(|e| ConfigError::Parse {
            format: "YAML".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(source).map_err(|e| ConfigError::Parse {
            format: "JSON".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse {
            format: "TOML".to_string(),
            reason: e.to_string(),
        })
    }

    /// Load a configuration file, choosing the format by extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let location = path.display().to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: location.clone(),
            reason: e.to_string(),
        })?;

        let config = match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&source)?,
            Some("json") => Self::from_json_str(&source)?,
            Some("toml") => Self::from_toml_str(&source)?,
            _ => return Err(ConfigError::UnsupportedFormat { path: location }),
        };

        tracing::info!(
            path = %path.display(),
            filters = config.filters.len(),
            "Loaded filter configuration"
        );

        Ok(config)
    }
}
