use std::fmt;

use serde::{Deserialize, Serialize};

/// Artist/title pair read from one deck.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackRecord {
    pub artist: String,
    pub title: String,
}

impl TrackRecord {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    /// A record is publishable only when both fields carry text.
    ///
    /// The UI reports empty strings while a deck is loading or the window
    /// is minimized, so half-filled records are common and expected.
    pub fn is_valid(&self) -> bool {
        !self.artist.trim().is_empty() && !self.title.trim().is_empty()
    }

    /// Key used to decide whether two records show the same track.
    pub fn key(&self) -> (&str, &str) {
        (&self.artist, &self.title)
    }
}

impl fmt::Display for TrackRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_record() {
        assert!(TrackRecord::new("DJ X", "Song A").is_valid());
    }

    #[test]
    fn test_blank_fields_are_invalid() {
        assert!(!TrackRecord::new("", "Song C").is_valid());
        assert!(!TrackRecord::new("DJ Z", "").is_valid());
        assert!(!TrackRecord::new("   ", "Song C").is_valid());
        assert!(!TrackRecord::new("DJ Z", "\t\n").is_valid());
    }

    #[test]
    fn test_key_and_display() {
        let record = TrackRecord::new("DJ X", "Song A");
        assert_eq!(record.key(), ("DJ X", "Song A"));
        assert_eq!(record.to_string(), "DJ X - Song A");
    }

    #[test]
    fn test_key_does_not_collide_across_fields() {
        let a = TrackRecord::new("A - B", "C");
        let b = TrackRecord::new("A", "B - C");
        assert_eq!(a.to_string(), b.to_string());
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_serializes_as_object() {
        let record = TrackRecord::new("DJ X", "Song A");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"artist":"DJ X","title":"Song A"}"#);
    }
}
