//! Hazard vocabulary — controlled hazard tags and their trigger keywords
//!
//! Classification is deliberately simple: lowercase the text, then report a
//! tag whenever ANY of its keywords occurs as a substring (no word
//! boundaries — "wet" matches inside "wetland"). Entry order doubles as the
//! precedence order for primary-hazard resolution.
//!
//! The vocabulary is an immutable value built once at startup and passed
//! explicitly; it is never a mutable global.

use serde::{Deserialize, Serialize};

/// One vocabulary entry: a hazard tag plus its trigger keywords.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabEntry {
    pub tag: String,
    pub keywords: Vec<String>,
}

/// Ordered hazard vocabulary. Tags are unique; order defines precedence.
#[derive(Debug, Clone)]
pub struct HazardVocabulary {
    entries: Vec<VocabEntry>,
}

impl HazardVocabulary {
    /// Build a vocabulary from entries. Keywords are lowercased up front so
    /// classification only lowercases the input text.
    pub fn new(entries: Vec<VocabEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| VocabEntry {
                tag: e.tag,
                keywords: e.keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();
        Self { entries }
    }

    /// The built-in hazard map, in precedence order.
    pub fn builtin() -> Self {
        let entry = |tag: &str, words: &[&str]| VocabEntry {
            tag: tag.to_string(),
            keywords: words.iter().map(|w| w.to_string()).collect(),
        };
        Self::new(vec![
            entry("slip", &["slip", "slipped", "floor", "oil", "wet", "spillage"]),
            entry("trip", &["trip", "stumble", "kept", "placed"]),
            entry("cut", &["cut", "sharp", "burr", "knife"]),
            entry("hit", &["hit", "struck", "impact"]),
            entry("wheel", &["wheel", "disc", "trolley", "rim"]),
            entry("fall", &["fall", "fell", "collapse"]),
            entry("hand", &["hand", "finger", "palm"]),
        ])
    }

    /// All tags in precedence order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.tag.as_str())
    }

    /// All hazard tags matched by `text`, in precedence order.
    ///
    /// Case-insensitive substring matching; empty text matches nothing.
    /// Never errors — unmatchable text degrades to an empty result.
    pub fn classify(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let t = text.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.keywords.iter().any(|w| t.contains(w.as_str())))
            .map(|e| e.tag.clone())
            .collect()
    }

    /// The highest-precedence tag among `tags`, or None for an empty set.
    pub fn primary<'a>(&'a self, tags: &[String]) -> Option<&'a str> {
        self.entries
            .iter()
            .map(|e| e.tag.as_str())
            .find(|t| tags.iter().any(|x| x == t))
    }
}

impl Default for HazardVocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// TESTS
// ============================================================================
