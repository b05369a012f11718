//! Downstream track updates.

use tracing::debug;

use crate::config::{OutputConfig, PlaceholderConfig};
use crate::error::Result;
use crate::track::TrackRecord;

/// Sends one string argument to one address on the downstream consumer.
pub trait Transport: Send + Sync {
    fn send(&self, address: &str, value: &str) -> Result<()>;
}

/// Sends artist/title pairs as two back-to-back messages.
///
/// The artist is always sent first and the title completes the pair. The
/// placeholder uses the same order. Callers serialize `publish` calls (see
/// [`ChangeDetector`](crate::detector::ChangeDetector)) so pairs never interleave.
pub struct Publisher<T> {
    transport: T,
    artist_address: String,
    title_address: String,
    placeholder_artist: String,
}

impl<T: Transport> Publisher<T> {
    pub fn new(transport: T, output: &OutputConfig, placeholder: &PlaceholderConfig) -> Self {
        Self {
            transport,
            artist_address: output.artist_address.clone(),
            title_address: output.title_address.clone(),
            placeholder_artist: placeholder.artist.clone(),
        }
    }

    pub fn publish(&self, record: &TrackRecord) -> Result<()> {
        self.send_pair(&record.artist, &record.title)
    }

    /// Tell the consumer the current value is stale: placeholder artist,
    /// empty title.
    pub fn publish_placeholder(&self) -> Result<()> {
        self.send_pair(&self.placeholder_artist, "")
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn send_pair(&self, artist: &str, title: &str) -> Result<()> {
        debug!("Sending artist='{}' title='{}'", artist, title);
        self.transport.send(&self.artist_address, artist)?;
        self.transport.send(&self.title_address, title)
    }
}

#[cfg(test)]
pub mod recording {
    //! Transport that records what it was asked to send.

    use std::sync::{Arc, Mutex};

    use super::Transport;
    use crate::config::{DEFAULT_ARTIST_ADDRESS, DEFAULT_TITLE_ADDRESS};
    use crate::error::{Error, Result};
    use crate::track::TrackRecord;

    #[derive(Debug, Clone, Default)]
    pub struct RecordingTransport {
        sent: Arc<Mutex<Vec<(String, String)>>>,
        fail: Arc<Mutex<bool>>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }

        /// Sent messages regrouped into (artist, title) pairs.
        pub fn records(&self) -> Vec<TrackRecord> {
            let sent = self.sent();
            sent.chunks(2)
                .map(|pair| {
                    assert_eq!(pair[0].0, DEFAULT_ARTIST_ADDRESS);
                    assert_eq!(pair[1].0, DEFAULT_TITLE_ADDRESS);
                    TrackRecord::new(pair[0].1.clone(), pair[1].1.clone())
                })
                .collect()
        }

        pub fn set_failing(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }
    }

    impl Transport for RecordingTransport {
        fn send(&self, address: &str, value: &str) -> Result<()> {
            if *self.fail.lock().unwrap() {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "consumer unreachable",
                )));
            }
            self.sent
                .lock()
                .unwrap()
                .push((address.to_string(), value.to_string()));
            Ok(())
        }
    }
}
