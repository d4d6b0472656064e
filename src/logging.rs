// src/logging.rs
// =============================================================================
// Log output setup.
//
// Logs go to stderr through tracing-subscriber so that stdout only carries
// the report (important for --json). RUST_LOG wins over the defaults below.
// =============================================================================

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "warn,a11y_guardian=info";
const VERBOSE_FILTER: &str = "warn,a11y_guardian=debug";

/// Filter used when RUST_LOG is not set
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    }
}

// Installs the global subscriber. Calling it twice is harmless: the second
// call leaves the first subscriber in place.
pub fn init_logging(verbose: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
