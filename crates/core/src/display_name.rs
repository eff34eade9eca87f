//! Display-name formatting for stores, products and customers.
//!
//! Names typed into the UI arrive in every casing imaginable ("toko abc",
//! "TOKO ABC", "Toko abc"). Canonical entities store a display form built by
//! [`format_display_name`], and lookups use the key built by
//! [`normalize_name`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Tokens that are learned as abbreviations when a store name is saved.
static ABBREVIATION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,5}$").expect("Invalid regex"));

/// A set of known abbreviations with case-insensitive lookup.
///
/// Each abbreviation keeps the casing it was stored with; that casing is what
/// the formatter emits. When two entries differ only by case, the first one
/// wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Abbreviations {
    canonical: Vec<String>,
    by_lowercase: HashMap<String, usize>,
}

impl Abbreviations {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an abbreviation. Returns `false` if an entry with the same
    /// case-insensitive spelling already exists or the name is blank.
    pub fn insert(&mut self, name: &str) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return false;
        }
        let key = trimmed.to_lowercase();
        if self.by_lowercase.contains_key(&key) {
            return false;
        }
        self.by_lowercase.insert(key, self.canonical.len());
        self.canonical.push(trimmed.to_owned());
        true
    }

    /// Look up the stored casing of `word`, ignoring case.
    #[must_use]
    pub fn canonical(&self, word: &str) -> Option<&str> {
        self.by_lowercase
            .get(&word.to_lowercase())
            .and_then(|&idx| self.canonical.get(idx))
            .map(String::as_str)
    }

    /// Whether `word` is a known abbreviation, ignoring case.
    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.canonical(word).is_some()
    }

    /// Iterate over abbreviations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.canonical.iter().map(String::as_str)
    }

    /// Number of abbreviations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Abbreviations {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name.as_ref());
        }
        set
    }
}

/// Format a raw name for display.
///
/// Per whitespace-delimited word:
/// 1. a registered abbreviation (any casing) is replaced by its stored casing,
/// 2. an all-caps word longer than one character is kept as is,
/// 3. anything else is title-cased.
///
/// Words are re-joined with single spaces. Empty input yields an empty string.
///
/// ```rust
/// # use tokoledger_core::{Abbreviations, format_display_name};
/// let abbreviations: Abbreviations = ["TKI"].into_iter().collect();
/// assert_eq!(format_display_name("cemerlang tki", &abbreviations), "Cemerlang TKI");
/// assert_eq!(format_display_name("cemerlang BDG", &Abbreviations::new()), "Cemerlang BDG");
/// ```
#[must_use]
pub fn format_display_name(raw: &str, abbreviations: &Abbreviations) -> String {
    raw.split_whitespace()
        .map(|word| format_word(word, abbreviations))
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_word(word: &str, abbreviations: &Abbreviations) -> String {
    if let Some(canonical) = abbreviations.canonical(word) {
        return canonical.to_owned();
    }

    if word.chars().count() > 1 && word == word.to_uppercase() {
        return word.to_owned();
    }

    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect()
    })
}

/// Build the case-insensitive lookup key for a name.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Extract tokens of 2 to 5 uppercase ASCII letters from a name.
///
/// These are the abbreviation candidates learned when a store is created.
/// Duplicates are removed; order of first appearance is kept.
#[must_use]
pub fn abbreviation_candidates(name: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for token in name.split_whitespace() {
        if ABBREVIATION_TOKEN.is_match(token) && !found.iter().any(|f| f == token) {
            found.push(token.to_owned());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> Abbreviations {
        names.iter().collect()
    }

    #[test]
    fn test_registered_abbreviation_uses_stored_casing() {
        assert_eq!(
            format_display_name("cemerlang tki", &set(&["TKI"])),
            "Cemerlang TKI"
        );
        assert_eq!(format_display_name("pt Abc", &set(&["PT", "ABC"])), "PT ABC");
        assert_eq!(format_display_name("ibu ptt", &set(&["PtT"])), "Ibu PtT");
    }

    #[test]
    fn test_all_caps_heuristic() {
        assert_eq!(
            format_display_name("cemerlang BDG", &Abbreviations::new()),
            "Cemerlang BDG"
        );
        // Single capital letters are title-cased, not treated as abbreviations
        assert_eq!(format_display_name("kopi A", &Abbreviations::new()), "Kopi A");
        assert_eq!(format_display_name("toko 99", &Abbreviations::new()), "Toko 99");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(
            format_display_name("mInyak GOReng", &Abbreviations::new()),
            "Minyak Goreng"
        );
        assert_eq!(format_display_name("élan", &Abbreviations::new()), "Élan");
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(
            format_display_name("  toko   abc\tjaya ", &Abbreviations::new()),
            "Toko Abc Jaya"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(format_display_name("", &set(&["TKI"])), "");
        assert_eq!(format_display_name("   ", &Abbreviations::new()), "");
    }

    #[test]
    fn test_idempotent() {
        let abbreviations = set(&["TKI", "PT"]);
        for raw in [
            "cemerlang tki",
            "pt sumber BDG makmur",
            "minyak goreng 2L",
            "a b c",
            "x1 y",
        ] {
            let once = format_display_name(raw, &abbreviations);
            let twice = format_display_name(&once, &abbreviations);
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_abbreviations_first_casing_wins() {
        let mut abbreviations = Abbreviations::new();
        assert!(abbreviations.insert("TKI"));
        assert!(!abbreviations.insert("tki"));
        assert!(!abbreviations.insert("  "));
        assert_eq!(abbreviations.len(), 1);
        assert_eq!(abbreviations.canonical("Tki"), Some("TKI"));
        assert!(abbreviations.contains("tKi"));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Toko ABC "), "toko abc");
    }

    #[test]
    fn test_abbreviation_candidates() {
        assert_eq!(
            abbreviation_candidates("Toko ABC cabang BDG ABC"),
            vec!["ABC".to_owned(), "BDG".to_owned()]
        );
        // Too short, too long, mixed case and digits are ignored
        assert!(abbreviation_candidates("A TOKOKU Abc AB1 abc").is_empty());
        assert_eq!(abbreviation_candidates("PT TOKO"), vec!["PT", "TOKO"]);
    }
}
