//! Request-Level Error Types
//!
//! Maps the rankdash error taxonomy onto HTTP responses. Invalid filter
//! values answer 404: a URL naming items that do not exist addresses a page
//! that does not exist.

use http::StatusCode;
use rankdash_core::{
    CacheError, ConfigError, DashError, FiltersError, FormatError, PathError, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// ERROR CODES
// ============================================================================

/// Category of a request failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A request argument failed validation.
    InvalidArgument,

    /// One or more filters rejected their values.
    InvalidFilters,

    /// Filter or runtime configuration is invalid.
    ConfigurationError,

    /// A path handed to URL generation is malformed.
    InvalidPath,

    /// The cache backend is unusable.
    CacheUnavailable,

    /// Anything else.
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidArgument | ErrorCode::InvalidFilters => StatusCode::NOT_FOUND,

            ErrorCode::CacheUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::ConfigurationError | ErrorCode::InvalidPath | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "Invalid request argument",
            ErrorCode::InvalidFilters => "Invalid filter values",
            ErrorCode::ConfigurationError => "Invalid configuration",
            ErrorCode::InvalidPath => "Invalid path",
            ErrorCode::CacheUnavailable => "Cache temporarily unavailable",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// WEB ERROR
// ============================================================================

/// Error returned from request handling, rendered as
/// `{"error": <code>, "message": <text>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct WebError {
    #[serde(rename = "error")]
    pub code: ErrorCode,
    pub message: String,
}

impl WebError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create an error with the code's default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    /// The JSON response body.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.code,
            "message": self.message,
        })
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl From<ValidationError> for WebError {
    fn from(err: ValidationError) -> Self {
        Self::new(ErrorCode::InvalidArgument, err.to_string())
    }
}

impl<T> From<FiltersError<T>> for WebError {
    fn from(err: FiltersError<T>) -> Self {
        Self::new(ErrorCode::InvalidFilters, err.to_string())
    }
}

impl From<ConfigError> for WebError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorCode::ConfigurationError, err.to_string())
    }
}

impl From<PathError> for WebError {
    fn from(err: PathError) -> Self {
        Self::new(ErrorCode::InvalidPath, err.to_string())
    }
}

impl From<CacheError> for WebError {
    fn from(err: CacheError) -> Self {
        Self::new(ErrorCode::CacheUnavailable, err.to_string())
    }
}

impl From<FormatError> for WebError {
    fn from(err: FormatError) -> Self {
        Self::internal_error(err.to_string())
    }
}

impl From<DashError> for WebError {
    fn from(err: DashError) -> Self {
        match err {
            DashError::Validation(e) => e.into(),
            DashError::Config(e) => e.into(),
            DashError::Path(e) => e.into(),
            DashError::Cache(e) => e.into(),
            DashError::Format(e) => e.into(),
            DashError::Filters { message, .. } => Self::new(ErrorCode::InvalidFilters, message),
        }
    }
}

/// Result type alias for request handling.
pub type WebResult<T> = Result<T, WebError>;

// ============================================================================
// TESTS
// ============================================================================
