//! Log subscriber setup for the binaries.
//!
//! The filter comes from `ASTDIFF_LOG` (standard `EnvFilter` directives,
//! e.g. `astdiff=debug`); unset or invalid values fall back to `warn`.
//! Events go to stderr so they never mix with report output.

use crate::constants::{DEFAULT_LOG_FILTER, LOG_ENV_VAR};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `verbose` raises the fallback level to `debug` for this crate. Calling it
/// again after a subscriber is installed does nothing.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "warn,astdiff=debug"
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
