//! Rankdash Web - Per-Request Glue
//!
//! Connects the filter engine and the cache to request handling:
//!
//! - [`RequestContext`]: decoded parameters, typed argument helpers,
//!   filter parsing, canonical URLs and redirects
//! - [`WebError`]: HTTP status mapping of the rankdash error taxonomy
//! - [`WebConfig`]: runtime settings from the environment
//! - [`init_tracing`]: subscriber installation
//!
//! The HTTP server itself is out of scope; handlers of any framework build a
//! [`RequestContext`] from the request URI and map [`WebError`] through
//! [`WebError::status_code`].

pub mod config;
pub mod error;
pub mod request;
pub mod telemetry;

pub use config::WebConfig;
pub use error::{ErrorCode, WebError, WebResult};
pub use request::{RequestContext, SortOrder, CACHE_ARGUMENT, ORDER_ARGUMENT};
pub use telemetry::init_tracing;
