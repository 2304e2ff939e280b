//! Logging configuration using the tracing ecosystem.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is the host program's call. This helper wires up a reasonable default for
//! programs that don't bring their own.

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log level if RUST_LOG is not set.
const DEFAULT_LOG_FILTER: &str = "zephyr=info,warn";

/// Initialize logging to stderr.
///
/// Log levels are configured via the `RUST_LOG` environment variable, e.g.
/// `RUST_LOG=zephyr=debug` to see every request the client issues.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
///
/// # Example
///
/// ```no_run
/// zephyr::logging::init().expect("Failed to initialize logging");
/// ```
pub fn init() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "zephyr client logging ready");

    Ok(())
}
