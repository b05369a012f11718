//! # deckbridge-core
//!
//! Mirrors the track shown on the mixer's authoritative deck to a downstream
//! consumer over OSC.
//!
//! Two activities share two pieces of state:
//!
//! - The [`EventListener`] receives "master deck changed" notifications and
//!   updates the [`AuthorityState`].
//! - The [`Poller`] samples the authoritative deck through the
//!   [`ConnectionSupervisor`] and hands records to the [`ChangeDetector`],
//!   which publishes complete, changed records via the [`Publisher`].
//!
//! The UI itself is behind [`ReaderPort`]; [`UiaReader`] implements it with
//! Windows UI Automation.

pub mod authority;
pub mod backoff;
pub mod bridge;
pub mod config;
pub mod deck;
pub mod detector;
pub mod error;
pub mod listener;
pub mod osc;
pub mod poller;
pub mod publisher;
pub mod reader;
pub mod scan;
pub mod shutdown;
pub mod supervisor;
pub mod track;

pub use authority::{AuthorityState, AuthoritySnapshot};
pub use backoff::ReconnectBackoff;
pub use bridge::Bridge;
pub use config::{
    BridgeConfig, BridgeConfigBuilder, DeckLayout, ListenConfig, OutputConfig, PlaceholderConfig,
    ReaderConfig,
};
pub use deck::DeckIndex;
pub use detector::ChangeDetector;
pub use error::{Error, ReaderError, Result};
pub use listener::{EventListener, Notification};
pub use osc::OscTransport;
pub use poller::Poller;
pub use publisher::{Publisher, Transport};
pub use reader::{ElementBounds, ReaderPort, UiaReader, WindowHealth};
pub use scan::{DeckSide, LayoutMatch, LayoutScan, scan_layout};
pub use shutdown::ShutdownSignal;
pub use supervisor::{ConnectionState, ConnectionSupervisor};
pub use track::TrackRecord;
