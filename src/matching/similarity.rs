/*!
 * Text similarity between subtitle lines.
 *
 * Lines are normalized (override tags removed, lower-cased, trimmed, ASCII
 * punctuation dropped) and compared with a character-multiset ratio: two
 * lines holding the same characters score 1.0, lines sharing no character
 * score 0.0.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::app_config::SyncConfig;

/// `{...}` override blocks, matched non-greedily
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{.*?\}").unwrap());

/// Typographic characters the sync matcher drops on top of ASCII punctuation
const EXTRA_PUNCTUATION: [char; 2] = ['’', '…'];

/// Remove every `{...}` override block
pub fn strip_tags(text: &str) -> String {
    TAG_REGEX.replace_all(text, "").into_owned()
}

/// Normalized form used for comparisons
pub fn normalize(text: &str) -> String {
    strip_tags(text)
        .to_lowercase()
        .trim()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect()
}

/// Upper bound of the matching-blocks ratio: counts shared characters
/// regardless of order. Two empty strings are identical.
pub fn quick_ratio(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a + len_b == 0 {
        return 1.0;
    }

    let mut available: HashMap<char, usize> = HashMap::new();
    for c in b.chars() {
        *available.entry(c).or_insert(0) += 1;
    }

    let mut matches = 0usize;
    for c in a.chars() {
        if let Some(count) = available.get_mut(&c) {
            if *count > 0 {
                *count -= 1;
                matches += 1;
            }
        }
    }

    2.0 * matches as f64 / (len_a + len_b) as f64
}

/// Similarity of two subtitle lines in [0, 1]
pub fn similarity(a: &str, b: &str) -> f64 {
    quick_ratio(&normalize(a), &normalize(b))
}

/// True when the line, tags removed, has no lowercase letter.
///
/// Credits, sound effects and song titles ("OST", "2", "BOOM") are written
/// this way and produce meaningless matches.
pub fn is_emphasis_only(text: &str) -> bool {
    strip_tags(text)
        .chars()
        .all(|c| c.is_uppercase() || c.is_numeric() || !c.is_alphabetic())
}

/// Decides whether two lines of a pairwise sync say the same thing
#[derive(Debug, Clone, PartialEq)]
pub enum TextMatcher {
    /// Both tracks share a language: normalized text ratio above `threshold`
    SameLanguage { threshold: f64 },

    /// Tracks in different languages: structural score at or above `threshold`
    CrossLanguage { threshold: f64 },
}

impl TextMatcher {
    pub fn from_config(config: &SyncConfig) -> Self {
        if config.cross_language {
            TextMatcher::CrossLanguage {
                threshold: config.cross_language_threshold,
            }
        } else {
            TextMatcher::SameLanguage {
                threshold: config.same_language_threshold,
            }
        }
    }

    /// Score of a pair on this matcher's own scale
    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            TextMatcher::SameLanguage { .. } => {
                quick_ratio(&normalize_for_sync(a), &normalize_for_sync(b))
            }
            TextMatcher::CrossLanguage { .. } => structural_similarity(a, b),
        }
    }

    pub fn matches(&self, a: &str, b: &str) -> bool {
        let score = self.score(a, b);
        match self {
            TextMatcher::SameLanguage { threshold } => score > *threshold,
            TextMatcher::CrossLanguage { threshold } => score >= *threshold,
        }
    }
}

fn normalize_for_sync(text: &str) -> String {
    strip_tags(text)
        .to_lowercase()
        .replace("\\n", "")
        .trim()
        .chars()
        .filter(|c| !c.is_ascii_punctuation() && !EXTRA_PUNCTUATION.contains(c))
        .collect()
}

fn relative_difference(a: usize, b: usize) -> f64 {
    a.abs_diff(b) as f64 / a.max(b).max(1) as f64
}

/// Language-independent resemblance of two lines: close length, punctuation
/// and word counts, and both being questions or both carrying override tags.
pub fn structural_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    let punctuation = |s: &str| s.chars().filter(|c| c.is_ascii_punctuation()).count();
    let spaces = |s: &str| s.matches(' ').count();

    let length_diff = relative_difference(a.chars().count(), b.chars().count());
    let punctuation_diff = relative_difference(punctuation(&a), punctuation(&b));
    let space_diff = relative_difference(spaces(&a), spaces(&b));
    let question_diff = if a.contains('?') && b.contains('?') { 0.0 } else { 1.0 };
    let tags_diff = if a.contains("{\\") && b.contains("{\\") { 0.0 } else { 1.0 };

    1.0 - (length_diff + punctuation_diff + space_diff + question_diff + tags_diff) / 5.0
}
