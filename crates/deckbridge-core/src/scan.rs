//! Layout discovery for the deck element table.
//!
//! Load known tracks on the decks, then scan for their titles and artists to
//! learn which container children hold them. Where the reader knows screen
//! positions, each match is also placed on the left or right half of the
//! window, which tells the two decks apart.

use serde::Serialize;

use crate::error::ReaderError;
use crate::reader::{ElementBounds, ReaderPort};

/// Half of the window an element sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum DeckSide {
    Left,
    Right,
}

impl DeckSide {
    fn of(element: ElementBounds, window: ElementBounds) -> Self {
        if element.left < window.center_x() {
            DeckSide::Left
        } else {
            DeckSide::Right
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutMatch {
    pub index: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<ElementBounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<DeckSide>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutScan {
    pub child_count: usize,
    pub matches: Vec<LayoutMatch>,
}

/// Connect and list container children whose text equals one of `targets`.
/// With no targets, every child with non-blank text is listed.
pub fn scan_layout<R: ReaderPort>(
    reader: &mut R,
    targets: &[String],
) -> Result<LayoutScan, ReaderError> {
    reader.connect()?;
    let child_count = reader.child_count()?;
    let window = reader.window_bounds()?;

    let mut matches = Vec::new();
    for index in 0..child_count {
        let text = reader.text_at(index)?;
        let wanted = if targets.is_empty() {
            !text.trim().is_empty()
        } else {
            targets.iter().any(|target| *target == text)
        };
        if wanted {
            let bounds = reader.bounds_at(index)?;
            let side = bounds.zip(window).map(|(b, w)| DeckSide::of(b, w));
            matches.push(LayoutMatch {
                index,
                text,
                bounds,
                side,
            });
        }
    }

    Ok(LayoutScan {
        child_count,
        matches,
    })
}
