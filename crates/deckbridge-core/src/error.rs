use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Deck index {index} out of range (deck count: {count})")]
    InvalidDeck { index: i64, count: usize },

    #[error("OSC error: {0}")]
    Osc(String),

    #[error("Reader error: {0}")]
    Reader(#[from] ReaderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by a [`ReaderPort`](crate::reader::ReaderPort).
///
/// None of these are fatal to the bridge; the connection supervisor turns
/// every one of them into "no value this tick".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    #[error("No window matching '{0}' found")]
    WindowNotFound(String),

    #[error("Anchor element '{0}' not found in window")]
    AnchorNotFound(String),

    #[error("Window is gone")]
    WindowGone,

    #[error("Not connected")]
    NotConnected,

    #[error("No element at container index {0}")]
    ElementMissing(usize),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("UI reading is only supported on Windows")]
    Unsupported,
}

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
