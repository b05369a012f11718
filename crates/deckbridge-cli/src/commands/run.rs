//! Main bridge mode.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use deckbridge_core::{Bridge, ShutdownSignal, UiaReader};
use tracing::info;

use crate::Overrides;
use crate::config;

pub fn run(config_path: &Path, overrides: &Overrides) -> Result<()> {
    let config = config::resolve(config_path, overrides)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let shutdown = Arc::new(ShutdownSignal::new());
    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        shutdown_ctrlc.trigger();
    })?;

    info!("deckbridge {}", env!("CARGO_PKG_VERSION"));

    let bridge = Bridge::bind(config).context("failed to bind bridge sockets")?;
    let reader = UiaReader::new(bridge.config().reader.clone());
    bridge.run(reader, shutdown)?;

    info!("Shutdown complete");
    Ok(())
}
