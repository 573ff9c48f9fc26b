//! Tracing initialisation.

use crate::config::WebConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to the configured
/// directive. Returns false when a subscriber was already installed, which
/// leaves the existing one in place.
pub fn init_tracing(config: &WebConfig) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .is_ok()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init().is_ok()
    };

    if installed {
        tracing::info!(
            url_root = %config.url_root,
            cache_enabled = config.cache_enabled,
            log_json = config.log_json,
            "Tracing initialized"
        );
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_init_is_noop() {
        let config = WebConfig::default();
        let _ = init_tracing(&config);
        assert!(!init_tracing(&config));
    }
}
