//! Tag curation and structural-marker normalization
//!
//! The audio model conditions on two text inputs: lyric bodies with
//! `[SECTION]` markers, and a short list of style tags. Both arrive from
//! the chat model in whatever formatting it felt like that day, so both
//! are scrubbed into a stable vocabulary before rendering.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Primary genres given ordering priority during curation.
///
/// Exactly one of these may survive into the final tag set, and it always
/// comes first: the audio model's genre conditioning is most stable when
/// the anchor leads.
pub const ANCHOR_GENRES: &[&str] = &[
    "pop",
    "rock",
    "electronic",
    "hiphop",
    "jazz",
    "classical",
    "techno",
    "trance",
    "ambient",
    "folk",
    "country",
];

/// Fallback pair when curation produces nothing usable.
pub const DEFAULT_TAGS: &[&str] = &["melodic", "electronic"];

/// Maximum number of tags handed to the audio model.
const MAX_TAGS: usize = 6;

/// Curated, ordered tag list.
///
/// Invariants: all lowercase, no duplicates, at most one anchor genre
/// (first if present), at most six entries, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    /// Curate a raw tag string from the tagger model.
    ///
    /// Splits on newlines, commas, semicolons, tabs and bullets; strips
    /// markdown emphasis, ordinal prefixes and trailing `:`-explanations;
    /// partitions anchors from seasoning while preserving first-seen order.
    pub fn curate(raw: &str) -> Self {
        static ORDINAL: OnceLock<Regex> = OnceLock::new();
        let ordinal = ORDINAL.get_or_init(|| Regex::new(r"^\d+[.)]\s*").unwrap());

        let text = raw.replace("**", "").replace("__", "").replace('*', "");

        let mut anchors: Vec<String> = Vec::new();
        let mut others: Vec<String> = Vec::new();

        for part in text.split(['\n', ',', ';', '\t', '•']) {
            let mut fragment = ordinal.replace(part.trim(), "").to_string();
            if let Some(colon) = fragment.find(':') {
                fragment.truncate(colon);
            }
            let clean = fragment.trim().to_lowercase();
            if clean.len() < 2 {
                continue;
            }

            if ANCHOR_GENRES.contains(&clean.as_str()) {
                if !anchors.contains(&clean) {
                    anchors.push(clean);
                }
            } else if !others.contains(&clean) {
                others.push(clean);
            }
        }

        // One anchor max, then seasoning, capped at six total.
        let mut tags: Vec<String> = anchors.into_iter().take(1).chain(others).collect();
        tags.truncate(MAX_TAGS);

        if tags.is_empty() {
            tags = DEFAULT_TAGS.iter().map(|t| t.to_string()).collect();
        }

        TagSet(tags)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comma-joined form handed to the audio model.
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }

    /// First tag if it is an anchor genre.
    pub fn anchor(&self) -> Option<&str> {
        self.0
            .first()
            .filter(|t| ANCHOR_GENRES.contains(&t.as_str()))
            .map(String::as_str)
    }
}

impl std::fmt::Display for TagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.joined())
    }
}

/// Rewrite bracketed structural markers to canonical uppercase form.
///
/// `**[intro]**` and `[ Verse 1 ]` both become `[INTRO]` / `[VERSE 1]`;
/// any bold wrapper is stripped. Text outside markers passes through
/// unmodified.
pub fn normalize_section_tags(lyrics: &str) -> String {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    let marker =
        MARKER.get_or_init(|| Regex::new(r"(\*\*|__)?\[\s*(.*?)\s*\](\*\*|__)?").unwrap());

    marker
        .replace_all(lyrics, |caps: &Captures| {
            format!("[{}]", caps[2].trim().to_uppercase())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_anchor_comes_first() {
        let tags = TagSet::curate("Dark, Energetic, Rock, Female");
        assert_eq!(tags.as_slice()[0], "rock");
        assert_eq!(tags.anchor(), Some("rock"));
    }

    #[test]
    fn test_single_anchor_cap() {
        let tags = TagSet::curate("rock, pop, jazz, dark");
        let anchors: Vec<_> = tags
            .as_slice()
            .iter()
            .filter(|t| ANCHOR_GENRES.contains(&t.as_str()))
            .collect();
        assert_eq!(anchors.len(), 1);
        assert_eq!(tags.as_slice(), ["rock", "dark"]);
    }

    #[test]
    fn test_six_tag_cap() {
        let tags = TagSet::curate("one1, two2, three3, four4, five5, six6, seven7, eight8");
        assert_eq!(tags.len(), 6);
    }

    #[test]
    fn test_deduplication_preserves_order() {
        let tags = TagSet::curate("dark, moody, dark, moody, dreamy");
        assert_eq!(tags.as_slice(), ["dark", "moody", "dreamy"]);
    }

    #[test_case("" ; "empty input")]
    #[test_case("x, y, z" ; "all fragments too short")]
    fn test_default_pair(raw: &str) {
        let tags = TagSet::curate(raw);
        assert_eq!(tags.as_slice(), DEFAULT_TAGS);
    }

    #[test]
    fn test_markdown_and_ordinals_stripped() {
        let tags = TagSet::curate("1. **Electronic**\n2) Dark: brooding atmosphere\n• Synthwave");
        assert_eq!(tags.as_slice(), ["electronic", "dark", "synthwave"]);
    }

    #[test]
    fn test_curation_is_idempotent() {
        let first = TagSet::curate("Rock, Dark, Female, Energetic");
        let second = TagSet::curate(&first.joined());
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_uppercases_and_unbolds() {
        let input = "**[intro]**\nLa la la\n__[ verse 1 ]__\nMore words";
        let got = normalize_section_tags(input);
        assert_eq!(got, "[INTRO]\nLa la la\n[VERSE 1]\nMore words");
    }

    #[test]
    fn test_normalize_leaves_plain_text_alone() {
        let input = "no markers at all, just words";
        assert_eq!(normalize_section_tags(input), input);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_section_tags("**[Chorus]** hey");
        let twice = normalize_section_tags(&once);
        assert_eq!(once, twice);
    }
}
