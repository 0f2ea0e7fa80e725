// Observability infrastructure using tracing crate
// Structured logging that shares the terminal with the per-tick progress lines

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the observability system.
/// Compact human-readable output; warnings for failed field collections land
/// here, interleaved with the progress lines on the same terminal.
pub fn init(verbose: bool) -> Result<()> {
    let fmt_layer = fmt::layer().compact().with_target(false);

    // Configure filter from environment or use the crate default
    // Example: RUST_LOG=sysperf=debug
    let default_filter = if verbose { "sysperf=debug" } else { "sysperf=info" };
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("Failed to create tracing filter")?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    Ok(())
}
