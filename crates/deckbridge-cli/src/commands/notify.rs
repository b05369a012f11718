//! Send one master-deck notification, as the upstream would.

use std::net::{SocketAddr, UdpSocket};
use std::path::Path;

use anyhow::{Context, Result};
use deckbridge_core::{DeckIndex, osc};
use tracing::info;

use crate::Overrides;
use crate::config;

pub fn run(config_path: &Path, deck: i32, target: Option<SocketAddr>) -> Result<()> {
    let config = config::resolve(config_path, &Overrides::default())?;
    let target = target.unwrap_or_else(|| local_target(config.listen.bind));
    let index = DeckIndex::validate(i64::from(deck), config.deck_count())?;

    let buf = osc::encode_deck_notification(&config.listen.address, deck)?;
    let socket = UdpSocket::bind(("0.0.0.0", 0))?;
    socket
        .send_to(&buf, target)
        .with_context(|| format!("failed to send to {}", target))?;

    info!("Sent {} ({}) -> {}", config.listen.address, index, target);
    Ok(())
}

/// Loopback address for a wildcard bind address.
fn local_target(bind: SocketAddr) -> SocketAddr {
    if bind.ip().is_unspecified() {
        SocketAddr::from(([127, 0, 0, 1], bind.port()))
    } else {
        bind
    }
}
