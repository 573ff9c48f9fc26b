//! Error types for rankdash operations

use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

fn join_values(values: &BTreeSet<String>) -> String {
    values
        .iter()
        .map(|v| format!("`{}`", v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A supplied request value is not acceptable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unrecognised values for filter `{key}`: {}", join_values(.values))]
    UnrecognizedValue {
        key: String,
        values: BTreeSet<String>,
    },

    #[error("Value for argument `{name}` (`{value}`) {reason}")]
    InvalidArgument {
        name: String,
        value: String,
        reason: String,
    },
}

impl ValidationError {
    /// The request key the error refers to.
    pub fn key(&self) -> &str {
        match self {
            ValidationError::UnrecognizedValue { key, .. } => key,
            ValidationError::InvalidArgument { name, .. } => name,
        }
    }
}

/// Invalid static configuration. Raised while building filters, never at
/// request time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Filter `{key}`: {first} and {second} overlap on {}", join_values(.values))]
    OverlappingValues {
        key: String,
        first: String,
        second: String,
        values: BTreeSet<String>,
    },

    #[error("Placeholder names {} not found in `{key}` item names", join_values(.names))]
    UnknownPlaceholderNames { key: String, names: BTreeSet<String> },

    #[error("Filter key `{key}` is declared by more than one filter")]
    DuplicateFilterKey { key: String },

    #[error("Filter `{key}` may not use the reserved item key `{item}`")]
    ReservedItemKey { key: String, item: String },

    #[error("Failed to parse {format} configuration: {reason}")]
    Parse { format: String, reason: String },

    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Unsupported configuration format for {path}")]
    UnsupportedFormat { path: String },
}

/// A path handed to the query rewriter is not a bare absolute path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Path may not contain a scheme or host, '{path}'")]
    Absolute { path: String },

    #[error("Path may not contain a query string, '{path}'")]
    ContainsQuery { path: String },

    #[error("Path may not contain parameters, '{path}'")]
    ContainsParams { path: String },

    #[error("Path must start with /, '{path}'")]
    NotRooted { path: String },
}

/// A translated template could not be filled in.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("No value supplied for placeholder `{name}` in template '{template}'")]
    MissingPlaceholder { name: String, template: String },
}

/// Cache collaborator failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend failed: {reason}")]
    Backend { reason: String },

    #[error("Cache value could not be (de)serialised: {reason}")]
    Serialization { reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Every validation error reported by a filter set for one request,
/// together with whatever could still be computed.
#[derive(Debug, Clone, PartialEq)]
pub struct FiltersError<T> {
    pub errors: Vec<ValidationError>,
    pub partial: T,
}

impl<T> FiltersError<T> {
    pub fn new(errors: Vec<ValidationError>, partial: T) -> Self {
        Self { errors, partial }
    }

    /// The keys of every filter that reported a problem.
    pub fn keys(&self) -> BTreeSet<&str> {
        self.errors.iter().map(ValidationError::key).collect()
    }
}

impl<T> fmt::Display for FiltersError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&message)
    }
}

impl<T: fmt::Debug> std::error::Error for FiltersError<T> {}

/// Master error type for all rankdash errors.
#[derive(Debug, Clone, Error)]
pub enum DashError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Filter error: {message}")]
    Filters {
        message: String,
        errors: Vec<ValidationError>,
    },
}

impl<T> From<FiltersError<T>> for DashError {
    fn from(err: FiltersError<T>) -> Self {
        DashError::Filters {
            message: err.to_string(),
            errors: err.errors,
        }
    }
}

/// Result type alias for rankdash operations.
pub type DashResult<T> = Result<T, DashError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_unrecognized_value_display() {
        let err = ValidationError::UnrecognizedValue {
            key: "country".to_string(),
            values: set(&["Atlantis", "Narnia"]),
        };
        let msg = err.to_string();
        assert!(msg.contains("`country`"));
        assert!(msg.contains("`Atlantis`, `Narnia`"));
        assert_eq!(err.key(), "country");
    }

    #[test]
    fn test_config_error_display_overlap() {
        let err = ConfigError::OverlappingValues {
            key: "country".to_string(),
            first: "items".to_string(),
            second: "groups".to_string(),
            values: set(&["EU"]),
        };
        let msg = err.to_string();
        assert!(msg.contains("items and groups"));
        assert!(msg.contains("`EU`"));
    }

    #[test]
    fn test_path_error_display() {
        let err = PathError::ContainsQuery {
            path: "/rank?x=1".to_string(),
        };
        assert!(err.to_string().contains("query string"));
    }

    #[test]
    fn test_format_error_display() {
        let err = FormatError::MissingPlaceholder {
            name: "count".to_string(),
            template: "Top {count}".to_string(),
        };
        assert!(err.to_string().contains("`count`"));
        assert!(matches!(DashError::from(err), DashError::Format(_)));
    }

    #[test]
    fn test_filters_error_joins_messages() {
        let err = FiltersError::new(
            vec![
                ValidationError::UnrecognizedValue {
                    key: "a".to_string(),
                    values: set(&["x"]),
                },
                ValidationError::UnrecognizedValue {
                    key: "b".to_string(),
                    values: set(&["y"]),
                },
            ],
            (),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("Unrecognised values for filter `a`"));
        assert!(msg.contains(" Unrecognised values for filter `b`"));
        assert_eq!(err.keys(), ["a", "b"].into_iter().collect());
    }

    #[test]
    fn test_dash_error_from_filters_error() {
        let err: DashError = FiltersError::new(
            vec![ValidationError::UnrecognizedValue {
                key: "a".to_string(),
                values: set(&["x"]),
            }],
            0u8,
        )
        .into();
        match err {
            DashError::Filters { errors, message } => {
                assert_eq!(errors.len(), 1);
                assert!(message.contains("`a`"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
