//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Env var holding the log filter, e.g. `PARAMSPEC_LOG=paramspec_schema=debug`.
pub const LOG_ENV_VAR: &str = "PARAMSPEC_LOG";

/// Filter used when neither `PARAMSPEC_LOG` nor config provides one.
pub const DEFAULT_FILTER: &str = "paramspec=info";

/// Initialize logging with the compiled default filter.
///
/// Idempotent: only the first call installs a subscriber.
pub fn init_tracing() {
    init_tracing_with_default(DEFAULT_FILTER);
}

/// Initialize logging with the `[logging]` filter of a resolved config.
/// `PARAMSPEC_LOG` still takes precedence when set.
pub fn init_tracing_from_config(config: &LoggingConfig) {
    init_tracing_with_default(config.effective_filter());
}

/// Initialize logging, falling back to `default_filter` when `PARAMSPEC_LOG`
/// is unset or does not parse. An unparseable `default_filter` falls back to
/// [`DEFAULT_FILTER`].
pub fn init_tracing_with_default(default_filter: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .or_else(|_| EnvFilter::try_new(default_filter))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        // A subscriber installed elsewhere (e.g. by a host application) wins.
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
