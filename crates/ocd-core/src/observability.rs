//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;

static INIT: Once = Once::new();

/// Initialize the tracing subscriber.
///
/// Reads the `OCD_LOG` environment variable for per-crate levels, e.g.
/// `OCD_LOG=ocd_data=debug,ocd_nn=warn`. Falls back to the configured
/// `log_level` when unset or invalid.
///
/// Idempotent: only the first call installs a subscriber.
pub fn init_tracing(config: &ObservabilityConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("OCD_LOG")
            .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

        let layer = fmt::layer()
            .with_target(true)
            .with_file(config.with_source_location)
            .with_line_number(config.with_source_location);

        // `try_init` so an embedding application's subscriber wins.
        let _ = tracing_subscriber::registry().with(layer).with(filter).try_init();
    });
}
