//! Access to the mixer's on-screen deck text.
//!
//! [`ReaderPort`] is the narrow interface the rest of the bridge sees. It
//! knows nothing about decks: it exposes a flat list of container children
//! and the text of each one. The deck-to-element mapping lives in
//! [`DeckLayout`](crate::config::DeckLayout).

#[cfg(test)]
pub mod mock;
mod uia;

pub use uia::UiaReader;

use serde::Serialize;

use crate::error::ReaderError;

/// Liveness of the target window as seen by a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum WindowHealth {
    /// Window exists and its UI tree is being updated.
    Alive,
    /// Window exists but is minimized; the application stops refreshing
    /// its UI tree until it is restored.
    Minimized,
}

/// Screen rectangle of a window or element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElementBounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ElementBounds {
    pub fn center_x(&self) -> i32 {
        self.left + (self.right - self.left) / 2
    }
}

/// Handle-based reader for the external window.
///
/// Implementations cache whatever handle [`ReaderPort::connect`] acquires
/// and drop it themselves when a call finds it unusable.
pub trait ReaderPort {
    /// Locate the window and the deck container, replacing any cached handle.
    fn connect(&mut self) -> Result<(), ReaderError>;

    /// Probe the cached window. An error means the handle is unusable.
    fn check_health(&mut self) -> Result<WindowHealth, ReaderError>;

    /// Un-minimize the window so its UI tree is refreshed again.
    fn restore(&mut self) -> Result<(), ReaderError>;

    /// Number of children of the deck container.
    fn child_count(&mut self) -> Result<usize, ReaderError>;

    /// Layout sanity check against the expected minimum child count.
    fn child_count_at_least(&mut self, min: usize) -> Result<bool, ReaderError> {
        Ok(self.child_count()? >= min)
    }

    /// Text of the container child at `index`.
    fn text_at(&mut self, index: usize) -> Result<String, ReaderError>;

    /// Screen rectangle of the connected window, if known.
    fn window_bounds(&mut self) -> Result<Option<ElementBounds>, ReaderError> {
        Ok(None)
    }

    /// Screen rectangle of the container child at `index`, if known.
    fn bounds_at(&mut self, _index: usize) -> Result<Option<ElementBounds>, ReaderError> {
        Ok(None)
    }

    /// Drop the cached handle; the next call must reconnect.
    fn disconnect(&mut self);
}
