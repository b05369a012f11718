//! Connection supervision for the UI reader.
//!
//! The supervisor is a small state machine over the reader's handle:
//!
//! ```text
//!              connect ok
//! Disconnected ──────────► Connected ◄──┐
//!      ▲                     │          │ restore + settle
//!      │ health/read error,  │ minimized│
//!      │ layout mismatch     ▼          │
//!      └────────────────── Minimized ───┘
//! ```
//!
//! Every failure ends up as "no record this call". Failed connects back off
//! so a closed mixer is not searched for on every tick.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::backoff::ReconnectBackoff;
use crate::config::{BridgeConfig, DeckLayout};
use crate::deck::DeckIndex;
use crate::error::ReaderError;
use crate::reader::{ReaderPort, WindowHealth};
use crate::track::TrackRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ConnectionState {
    /// No usable handle; the next call tries to connect.
    Disconnected,
    /// Handle passed its last health check.
    Connected,
    /// Window found minimized and is being restored.
    Minimized,
}

pub struct ConnectionSupervisor<R> {
    reader: R,
    decks: Vec<DeckLayout>,
    min_child_count: usize,
    restore_settle: Duration,
    backoff: ReconnectBackoff,
    state: ConnectionState,
    failed_connects: u32,
    retry_at: Option<Instant>,
}

impl<R: ReaderPort> ConnectionSupervisor<R> {
    pub fn new(reader: R, config: &BridgeConfig) -> Self {
        Self {
            reader,
            decks: config.decks.clone(),
            min_child_count: config.reader.min_child_count,
            restore_settle: config.reader.restore_settle(),
            backoff: config.reader.backoff(),
            state: ConnectionState::Disconnected,
            failed_connects: 0,
            retry_at: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Make sure a usable handle exists, reconnecting if needed.
    ///
    /// Blocks for at most one health check, one restore settle delay and
    /// one connect attempt.
    pub fn ensure_connected(&mut self) -> bool {
        match self.state {
            ConnectionState::Disconnected => self.try_connect(),
            ConnectionState::Connected | ConnectionState::Minimized => {
                match self.reader.check_health() {
                    Ok(WindowHealth::Alive) => {
                        self.state = ConnectionState::Connected;
                        true
                    }
                    Ok(WindowHealth::Minimized) => self.recover_minimized(),
                    Err(e) => {
                        self.invalidate(&e.to_string());
                        self.try_connect()
                    }
                }
            }
        }
    }

    /// Read one deck's record.
    ///
    /// Returns `None` when the reader is unavailable, the layout does not
    /// match, or any read fails; the handle is invalidated in the latter two
    /// cases so the next call reconnects.
    pub fn read(&mut self, deck: DeckIndex) -> Option<TrackRecord> {
        if !self.ensure_connected() {
            return None;
        }

        let Some(layout) = self.decks.get(deck.get()).copied() else {
            debug!("No element layout configured for {}", deck);
            return None;
        };

        match self.read_layout(layout) {
            Ok(record) => record,
            Err(e) => {
                self.invalidate(&format!("read failed: {}", e));
                None
            }
        }
    }

    /// Drop the handle unconditionally; the next call reconnects.
    pub fn reset(&mut self) {
        self.invalidate("reset requested");
    }

    fn read_layout(&mut self, layout: DeckLayout) -> Result<Option<TrackRecord>, ReaderError> {
        if !self.reader.child_count_at_least(self.min_child_count)? {
            self.invalidate("layout changed or incomplete");
            return Ok(None);
        }

        let title = self.reader.text_at(layout.title_element)?;
        let artist = self.reader.text_at(layout.artist_element)?;
        Ok(Some(TrackRecord::new(artist, title)))
    }

    fn recover_minimized(&mut self) -> bool {
        self.state = ConnectionState::Minimized;
        info!("Window is minimized, restoring to keep deck text updating");

        if let Err(e) = self.reader.restore() {
            self.invalidate(&format!("restore failed: {}", e));
            return false;
        }

        thread::sleep(self.restore_settle);
        self.state = ConnectionState::Connected;
        true
    }

    fn try_connect(&mut self) -> bool {
        if let Some(retry_at) = self.retry_at
            && Instant::now() < retry_at
        {
            return false;
        }

        match self.reader.connect() {
            Ok(()) => {
                info!("Connected to mixer window");
                self.state = ConnectionState::Connected;
                self.failed_connects = 0;
                self.retry_at = None;
                true
            }
            Err(e) => {
                let delay = self.backoff.delay(self.failed_connects);
                if self.failed_connects == 0 {
                    warn!("Connection failed: {} (retrying in {:?})", e, delay);
                } else {
                    debug!(
                        "Connection failed: {} (attempt {}, retrying in {:?})",
                        e,
                        self.failed_connects + 1,
                        delay
                    );
                }
                self.failed_connects = self.failed_connects.saturating_add(1);
                self.retry_at = Some(Instant::now() + delay);
                self.state = ConnectionState::Disconnected;
                false
            }
        }
    }

    fn invalidate(&mut self, reason: &str) {
        warn!("Dropping reader handle: {}", reason);
        self.reader.disconnect();
        self.state = ConnectionState::Disconnected;
    }
}
