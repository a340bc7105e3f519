use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence when set. Otherwise only warnings are shown,
/// or everything down to debug level when `verbose` is true.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "ephem=debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();

    // Already installed, e.g. when called twice from tests.
    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}
