//! Term extraction shared by the classifier, retriever and reviewers.

use std::collections::BTreeSet;

/// Minimum token length kept as a content term.
pub const MIN_TERM_LEN: usize = 3;

/// Function words that carry no retrieval signal.
pub const STOP_WORDS: &[&str] = &[
    "about", "after", "again", "all", "also", "and", "any", "are", "because", "been", "before",
    "being", "but", "can", "could", "did", "does", "doing", "don", "even", "for", "from", "get",
    "getting", "had", "has", "have", "having", "her", "here", "him", "his", "how", "into",
    "its", "just", "keep", "more", "most", "much", "need", "not", "now", "off", "once", "only",
    "other", "our", "out", "over", "own", "please", "same", "she", "should", "some", "such",
    "than", "that", "the", "their", "them", "then", "there", "these", "they", "this", "those",
    "though", "through", "too", "under", "until", "very", "was", "were", "what", "when", "where",
    "which", "while", "who", "why", "will", "with", "would", "you", "your", "yours",
];

/// Lower-case and replace every non-alphanumeric character with a space.
///
/// The result is padded with one leading and trailing space so that
/// `" {phrase} "` containment is a word-boundary match.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    let mut last_space = true;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    if !last_space {
        out.push(' ');
    }
    out
}

/// Whether `phrase` occurs in `normalized` on word boundaries.
///
/// `normalized` must come from [`normalize`]; `phrase` is normalized here.
pub fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    let needle = normalize(phrase);
    if needle.trim().is_empty() {
        return false;
    }
    normalized.contains(&needle)
}

/// Lower-cased alphanumeric tokens, in order, duplicates kept.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Distinct content terms: tokens of length >= `MIN_TERM_LEN` minus stop words.
pub fn content_terms(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() >= MIN_TERM_LEN && !is_stop_word(t))
        .collect()
}
