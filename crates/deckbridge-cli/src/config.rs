//! Config file loading.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use deckbridge_core::{BridgeConfig, Error, Result};
use tracing::{info, warn};

use crate::Overrides;

/// Parse a TOML config file.
pub fn load(path: &Path) -> Result<BridgeConfig> {
    let content = fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<BridgeConfig> {
    toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
}

/// Load the config file, falling back to defaults when it does not exist,
/// then apply command-line overrides and validate.
pub fn resolve(path: &Path, overrides: &Overrides) -> Result<BridgeConfig> {
    let mut config = match load(path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) if e.is_not_found() => {
            warn!("Config file {} not found, using defaults", path.display());
            BridgeConfig::default()
        }
        Err(e) => return Err(e),
    };

    apply_overrides(&mut config, overrides);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut BridgeConfig, overrides: &Overrides) {
    if let Some(port) = overrides.listen_port {
        config.listen.bind.set_port(port);
    }
    if let Some(port) = overrides.output_port {
        config.output.destination = SocketAddr::from(([127, 0, 0, 1], port));
    }
    if let Some(ms) = overrides.poll_ms {
        config.poll_interval_ms = ms;
    }
    if overrides.no_placeholder {
        config.placeholder.enabled = false;
    }
}

pub fn to_toml(config: &BridgeConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))
}
