//! Bridge configuration.
//!
//! All values here are data: ports, addresses, timings and the per-deck
//! element indices. Only the UI reader interprets the element indices; the
//! rest of the core treats them as opaque numbers.
//!
//! Every section is `#[serde(default)]`, so a config file only needs to name
//! the values it changes:
//!
//! ```toml
//! poll_interval_ms = 250
//!
//! [placeholder]
//! enabled = false
//!
//! [[decks]]
//! title_element = 131
//! artist_element = 133
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::authority::MAX_DECKS;
use crate::backoff::ReconnectBackoff;
use crate::error::{Error, Result};

/// Default OSC address for authority-change notifications
pub const DEFAULT_DECK_ADDRESS: &str = "/deck/master";
/// Default OSC address for the artist half of a track update
pub const DEFAULT_ARTIST_ADDRESS: &str = "/track/master/artist";
/// Default OSC address for the title half of a track update
pub const DEFAULT_TITLE_ADDRESS: &str = "/track/master/title";
/// Default artist text sent while the new deck has not been sampled yet
pub const DEFAULT_PLACEHOLDER_ARTIST: &str = "Loading...";

/// Inbound notification socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Local address the notification socket binds to
    pub bind: SocketAddr,
    /// OSC address carrying the new authoritative deck index
    pub address: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 4455)),
            address: DEFAULT_DECK_ADDRESS.to_string(),
        }
    }
}

/// Outbound update socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where track updates are sent
    pub destination: SocketAddr,
    /// Local address the sending socket binds to
    pub bind: SocketAddr,
    pub artist_address: String,
    pub title_address: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            destination: SocketAddr::from(([127, 0, 0, 1], 4460)),
            bind: SocketAddr::from(([0, 0, 0, 0], 0)),
            artist_address: DEFAULT_ARTIST_ADDRESS.to_string(),
            title_address: DEFAULT_TITLE_ADDRESS.to_string(),
        }
    }
}

/// Interim "clear" message sent when the authoritative deck changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    pub enabled: bool,
    pub artist: String,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            artist: DEFAULT_PLACEHOLDER_ARTIST.to_string(),
        }
    }
}

/// Container child indices holding one deck's title and artist text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckLayout {
    pub title_element: usize,
    pub artist_element: usize,
}

impl DeckLayout {
    pub const fn new(title_element: usize, artist_element: usize) -> Self {
        Self {
            title_element,
            artist_element,
        }
    }
}

/// UI reader and connection policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Case-insensitive substring of the target window title
    pub window_title: String,
    /// Text of the element whose parent is the deck container
    pub anchor: String,
    /// Only attach to visible windows
    pub require_visible: bool,
    /// Containers with fewer children are treated as a layout mismatch
    pub min_child_count: usize,
    /// Wait after restoring a minimized window during a health check (ms)
    pub restore_settle_ms: u64,
    /// Wait after restoring a minimized window during connect (ms)
    pub connect_settle_ms: u64,
    /// First reconnect delay after a failed connect (ms)
    pub reconnect_first_ms: u64,
    /// Reconnect delay cap (ms)
    pub reconnect_max_ms: u64,
    /// Reconnect delay growth factor
    pub reconnect_factor: f64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            window_title: "rekordbox".to_string(),
            anchor: "4Deck Horizontal".to_string(),
            require_visible: false,
            min_child_count: 160,
            restore_settle_ms: 200,
            connect_settle_ms: 500,
            reconnect_first_ms: 250,
            reconnect_max_ms: 5_000,
            reconnect_factor: 2.0,
        }
    }
}

impl ReaderConfig {
    pub fn restore_settle(&self) -> Duration {
        Duration::from_millis(self.restore_settle_ms)
    }

    pub fn connect_settle(&self) -> Duration {
        Duration::from_millis(self.connect_settle_ms)
    }

    pub fn backoff(&self) -> ReconnectBackoff {
        ReconnectBackoff {
            first: Duration::from_millis(self.reconnect_first_ms),
            max: Duration::from_millis(self.reconnect_max_ms),
            factor: self.reconnect_factor,
        }
    }
}

/// Complete bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Interval between UI samples (ms)
    pub poll_interval_ms: u64,
    pub listen: ListenConfig,
    pub output: OutputConfig,
    pub placeholder: PlaceholderConfig,
    pub reader: ReaderConfig,
    /// One entry per deck; the deck count is the length of this list
    pub decks: Vec<DeckLayout>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            listen: ListenConfig::default(),
            output: OutputConfig::default(),
            placeholder: PlaceholderConfig::default(),
            reader: ReaderConfig::default(),
            decks: vec![DeckLayout::new(131, 133), DeckLayout::new(155, 157)],
        }
    }
}

impl BridgeConfig {
    /// Create a new configuration builder
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn deck_count(&self) -> usize {
        self.decks.len()
    }

    /// Reject configurations the bridge cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.decks.is_empty() {
            return Err(Error::Config("at least one deck must be configured".into()));
        }
        if self.decks.len() > MAX_DECKS {
            return Err(Error::Config(format!(
                "{} decks configured, at most {} are supported",
                self.decks.len(),
                MAX_DECKS
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be greater than 0".into()));
        }
        let factor = self.reader.reconnect_factor;
        if factor.is_nan() || factor < 1.0 {
            return Err(Error::Config(format!(
                "reader.reconnect_factor must be >= 1.0 (got {})",
                self.reader.reconnect_factor
            )));
        }
        if self.reader.reconnect_first_ms > self.reader.reconnect_max_ms {
            return Err(Error::Config(
                "reader.reconnect_first_ms must not exceed reader.reconnect_max_ms".into(),
            ));
        }
        if self.output.artist_address == self.output.title_address {
            return Err(Error::Config(format!(
                "artist and title share the OSC address '{}'",
                self.output.artist_address
            )));
        }
        for address in [
            &self.listen.address,
            &self.output.artist_address,
            &self.output.title_address,
        ] {
            if !address.starts_with('/') {
                return Err(Error::Config(format!(
                    "OSC address '{}' must start with '/'",
                    address
                )));
            }
        }
        Ok(())
    }
}

/// Builder for BridgeConfig
#[derive(Debug, Clone, Default)]
pub struct BridgeConfigBuilder {
    poll_interval: Option<Duration>,
    listen_bind: Option<SocketAddr>,
    destination: Option<SocketAddr>,
    placeholder_enabled: Option<bool>,
    placeholder_artist: Option<String>,
    decks: Option<Vec<DeckLayout>>,
    reader: Option<ReaderConfig>,
}

impl BridgeConfigBuilder {
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn listen_bind(mut self, addr: SocketAddr) -> Self {
        self.listen_bind = Some(addr);
        self
    }

    pub fn destination(mut self, addr: SocketAddr) -> Self {
        self.destination = Some(addr);
        self
    }

    /// Enable or disable the placeholder message on deck changes
    pub fn placeholder(mut self, enabled: bool) -> Self {
        self.placeholder_enabled = Some(enabled);
        self
    }

    pub fn placeholder_artist<S: Into<String>>(mut self, artist: S) -> Self {
        self.placeholder_artist = Some(artist.into());
        self
    }

    pub fn decks(mut self, decks: Vec<DeckLayout>) -> Self {
        self.decks = Some(decks);
        self
    }

    pub fn reader(mut self, reader: ReaderConfig) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Build the configuration
    pub fn build(self) -> BridgeConfig {
        let mut config = BridgeConfig::default();
        if let Some(interval) = self.poll_interval {
            config.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        }
        if let Some(addr) = self.listen_bind {
            config.listen.bind = addr;
        }
        if let Some(addr) = self.destination {
            config.output.destination = addr;
        }
        if let Some(enabled) = self.placeholder_enabled {
            config.placeholder.enabled = enabled;
        }
        if let Some(artist) = self.placeholder_artist {
            config.placeholder.artist = artist;
        }
        if let Some(decks) = self.decks {
            config.decks = decks;
        }
        if let Some(reader) = self.reader {
            config.reader = reader;
        }
        config
    }
}
