//! Logging setup.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

pub const LOG_ENV: &str = "SITE_RISK_LOG";

/// Default filter when `SITE_RISK_LOG` is unset or invalid.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "site_risk=debug"
    } else {
        "warn"
    }
}

/// Initialize the tracing subscriber, writing to stderr.
///
/// `SITE_RISK_LOG` takes precedence, e.g. `SITE_RISK_LOG=site_risk::scoring=debug`.
/// Calling it more than once is a no-op.
pub fn init_logging(verbose: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(false), "warn");
        assert_eq!(default_filter(true), "site_risk=debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_logging(false);
        init_logging(true);
    }
}
