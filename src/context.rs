//! Rolling narrative context across an album run
//!
//! Track *i+1*'s lyric prompt references what track *i* actually produced,
//! so continuity only reflects tracks that drafted successfully.

use serde::{Deserialize, Serialize};

/// Sentinel summary for the first track of an album.
pub const FIRST_TRACK_CONTEXT: &str = "None (First Track)";

/// Sentinel mood for the first track of an album.
pub const FIRST_TRACK_MOOD: &str = "Neutral";

/// Number of lyric characters kept as the rolling summary.
const SUMMARY_CHARS: usize = 50;

/// One completed track's contribution to the rolling context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub title: String,
    /// First ~50 characters of the lyrics plus an ellipsis.
    pub summary: String,
    pub mood: String,
}

impl ContextEntry {
    /// Build an entry from a finished track's fields.
    pub fn from_track(title: &str, lyrics: &str, mood: &str) -> Self {
        let prefix: String = lyrics.chars().take(SUMMARY_CHARS).collect();
        Self {
            title: title.to_string(),
            summary: format!("{prefix}..."),
            mood: mood.to_string(),
        }
    }
}

/// Append-only context history, scoped to one album run.
#[derive(Debug, Default)]
pub struct ContextPropagator {
    history: Vec<ContextEntry>,
}

impl ContextPropagator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary and mood of the most recent track, or the first-track
    /// sentinels when nothing has been produced yet.
    pub fn previous(&self) -> (&str, &str) {
        match self.history.last() {
            Some(entry) => (&entry.summary, &entry.mood),
            None => (FIRST_TRACK_CONTEXT, FIRST_TRACK_MOOD),
        }
    }

    /// Record a successfully drafted track. The only mutator.
    pub fn append(&mut self, entry: ContextEntry) {
        self.history.push(entry);
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn entries(&self) -> &[ContextEntry] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sentinels_before_first_append() {
        let ctx = ContextPropagator::new();
        assert_eq!(ctx.previous(), (FIRST_TRACK_CONTEXT, FIRST_TRACK_MOOD));
    }

    #[test]
    fn test_previous_tracks_last_append() {
        let mut ctx = ContextPropagator::new();
        ctx.append(ContextEntry::from_track("One", "first lyrics", "Calm"));
        ctx.append(ContextEntry::from_track("Two", "second lyrics", "Tense"));

        let (summary, mood) = ctx.previous();
        assert_eq!(summary, "second lyrics...");
        assert_eq!(mood, "Tense");
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_summary_truncates_long_lyrics() {
        let lyrics = "x".repeat(200);
        let entry = ContextEntry::from_track("Long", &lyrics, "Neutral");
        assert_eq!(entry.summary.chars().count(), 53); // 50 + "..."
    }

    #[test]
    fn test_summary_is_char_safe_on_multibyte() {
        let lyrics = "é".repeat(60);
        let entry = ContextEntry::from_track("Accents", &lyrics, "Neutral");
        assert!(entry.summary.starts_with("ééé"));
    }
}
