//! Logging initialisation

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global subscriber: INFO by default, DEBUG when verbose,
/// newline-delimited JSON when `json` is set
pub fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let installed = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.context("Failed to set tracing subscriber")
}
