use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Verbosity;

/// Install the global `tracing` subscriber, logging to stderr
///
/// `RUST_LOG` takes precedence over the verbosity-derived filter. Stdout is
/// left to the results.
pub fn init_telemetry(verbosity: Verbosity) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| verbosity.filter_directive().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
