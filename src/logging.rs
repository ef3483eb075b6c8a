//! Diagnostic logging on stderr, kept apart from the report on stdout.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive for a given `-v` count. Zero keeps the configured level.
pub fn directive(configured: &str, verbosity: u8) -> &str {
    match verbosity {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn filter(configured: &str, verbosity: u8) -> Result<EnvFilter> {
    let directive = directive(configured, verbosity);
    EnvFilter::try_new(directive).with_context(|| format!("invalid log level {directive:?}"))
}

/// Install the global subscriber. Called once, from `main`.
pub fn init(configured: &str, verbosity: u8) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter(configured, verbosity)?)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .context("installing log subscriber")
}
