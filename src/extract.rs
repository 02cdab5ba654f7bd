//! Structured-data recovery from free-text model output
//!
//! Chat models wrap JSON in prose, code fences, or reasoning markers.
//! Extraction runs a fixed sequence of recovery tiers and reports either
//! the parsed value or the raw text. The caller decides the fallback; the
//! extractor never guesses at malformed input.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Outcome of attempting to recover structured data from model text.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// A strict parse succeeded on the cleaned text or a bracketed region.
    Parsed(Value),
    /// No tier produced valid JSON; the raw text is kept for logging.
    Malformed(String),
}

impl Extraction {
    /// The parsed value, if any.
    pub fn value(self) -> Option<Value> {
        match self {
            Extraction::Parsed(v) => Some(v),
            Extraction::Malformed(_) => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Extraction::Parsed(_))
    }
}

/// Expected top-level shape of the recovered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedShape {
    Object,
    Array,
}

fn object_region() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Greedy: the widest `{...}` span, so nested objects stay intact.
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").unwrap())
}

fn array_region() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").unwrap())
}

/// Strip code-fence markers without touching the fenced content.
fn strip_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```lyrics", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Recover a JSON document of the expected shape from raw model text.
///
/// Tier 1: strict parse of the fence-stripped text. Tier 2: strict parse
/// of the largest bracketed region. Tier 3: `Malformed`. No lenient
/// parsing in between.
pub fn extract(text: &str, shape: ExpectedShape) -> Extraction {
    let cleaned = strip_fences(text);
    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        if shape_matches(&value, shape) {
            return Extraction::Parsed(value);
        }
    }

    let region = match shape {
        ExpectedShape::Object => object_region(),
        ExpectedShape::Array => array_region(),
    };
    if let Some(m) = region.find(text) {
        if let Ok(value) = serde_json::from_str::<Value>(m.as_str()) {
            if shape_matches(&value, shape) {
                return Extraction::Parsed(value);
            }
        }
    }

    Extraction::Malformed(text.to_string())
}

/// Recover a JSON object (`{...}`) from raw model text.
pub fn extract_object(text: &str) -> Extraction {
    extract(text, ExpectedShape::Object)
}

fn shape_matches(value: &Value, shape: ExpectedShape) -> bool {
    match shape {
        ExpectedShape::Object => value.is_object(),
        ExpectedShape::Array => value.is_array(),
    }
}
