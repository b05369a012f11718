//! Currently authoritative deck.
//!
//! Written by the event listener, read by the poller. The deck index and a
//! change counter ("epoch") are packed into one `AtomicU64` so a reader always
//! sees a matching pair: the low 16 bits hold the index, the rest the epoch.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::deck::DeckIndex;

const INDEX_BITS: u32 = 16;
const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;

/// Largest deck count the packed index can hold.
pub const MAX_DECKS: usize = 1 << INDEX_BITS;

/// Deck index observed together with the epoch it was current in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthoritySnapshot {
    pub deck: DeckIndex,
    pub epoch: u64,
}

#[derive(Debug)]
pub struct AuthorityState {
    word: AtomicU64,
    deck_count: usize,
}

impl AuthorityState {
    /// Start with the first deck authoritative.
    ///
    /// # Panics
    /// Panics if `deck_count` is zero or does not fit the packed index.
    pub fn new(deck_count: usize) -> Self {
        assert!(
            deck_count > 0 && deck_count <= MAX_DECKS,
            "deck count {} out of range",
            deck_count
        );
        Self {
            word: AtomicU64::new(pack(DeckIndex::FIRST, 0)),
            deck_count,
        }
    }

    pub fn deck_count(&self) -> usize {
        self.deck_count
    }

    pub fn get(&self) -> DeckIndex {
        self.snapshot().deck
    }

    pub fn snapshot(&self) -> AuthoritySnapshot {
        unpack(self.word.load(Ordering::Acquire))
    }

    /// Whether `snapshot` is still the current authority.
    pub fn is_current(&self, snapshot: AuthoritySnapshot) -> bool {
        self.snapshot().epoch == snapshot.epoch
    }

    /// Make `deck` authoritative.
    ///
    /// Returns the previous deck when this was a change, `None` when `deck`
    /// was already authoritative (the epoch is left untouched).
    pub fn set(&self, deck: DeckIndex) -> Option<DeckIndex> {
        self.word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let current = unpack(word);
                (current.deck != deck).then(|| pack(deck, current.epoch.wrapping_add(1)))
            })
            .ok()
            .map(|previous| unpack(previous).deck)
    }
}

fn pack(deck: DeckIndex, epoch: u64) -> u64 {
    (epoch << INDEX_BITS) | deck.get() as u64
}

fn unpack(word: u64) -> AuthoritySnapshot {
    AuthoritySnapshot {
        // Only validated indices are ever packed.
        deck: DeckIndex::from_validated((word & INDEX_MASK) as usize),
        epoch: word >> INDEX_BITS,
    }
}
