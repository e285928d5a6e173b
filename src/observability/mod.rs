//! # Observability Infrastructure
//!
//! Structured logging for the connection manager using the tracing
//! ecosystem: an env-filtered fmt subscriber with optional JSON output,
//! initialized once at startup.

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;
use crate::errors::Result;

/// Initialize logging from the observability configuration.
///
/// `RUST_LOG` takes precedence over the configured log level. Repeated
/// initialization is tolerated so integration tests can call this freely.
pub fn init_observability(config: &ObservabilityConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if config.json_logging {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    if result.is_err() {
        // Subscriber already set elsewhere (e.g. integration tests); ignore.
        return Ok(());
    }

    info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        json_logging = config.json_logging,
        "Observability initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = ObservabilityConfig::default();
        assert!(init_observability(&config).is_ok());
        assert!(init_observability(&config).is_ok());
    }
}
