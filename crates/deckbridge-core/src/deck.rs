use std::fmt;

use crate::error::{Error, Result};

/// Index of one of the parallel decks the mixer exposes.
///
/// A `DeckIndex` is only ever constructed through [`DeckIndex::new`] or
/// [`DeckIndex::validate`], so holding one means it was in range for the
/// configured deck count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeckIndex(usize);

impl DeckIndex {
    /// The deck that is authoritative at startup.
    pub const FIRST: DeckIndex = DeckIndex(0);

    /// Validate a raw index against the deck count (`0 <= raw < deck_count`).
    pub fn new(raw: i64, deck_count: usize) -> Option<Self> {
        usize::try_from(raw)
            .ok()
            .filter(|&index| index < deck_count)
            .map(DeckIndex)
    }

    /// Like [`DeckIndex::new`], but reports why the index was rejected.
    pub fn validate(raw: i64, deck_count: usize) -> Result<Self> {
        Self::new(raw, deck_count).ok_or(Error::InvalidDeck {
            index: raw,
            count: deck_count,
        })
    }

    pub(crate) const fn from_validated(index: usize) -> Self {
        DeckIndex(index)
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// One-based deck number as printed on the mixer.
    pub fn number(self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for DeckIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deck {}", self.number())
    }
}
