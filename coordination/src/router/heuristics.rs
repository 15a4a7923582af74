//! Post-hoc domain heuristics that nudge category scores.
//!
//! These catch signals neither keyword lists nor phrasing patterns express
//! well: monetary amounts, compromised-credential language, numeric error
//! codes, how-to phrasing and urgency.

use std::sync::LazyLock;

use regex::Regex;

use crate::retrieval::terms::contains_phrase;
use crate::ticket::Category;

static MONETARY_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[$£€¥]\s?\d+(?:[.,]\d{1,2})?|\b\d+(?:\.\d{2})?\s?(?:usd|eur|gbp|dollars|euros)\b")
        .expect("MONETARY_AMOUNT regex should compile")
});

static ERROR_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"error\s*(?:code\s*)?#?\d{3,}|\b\d{3}\s*error\b")
        .expect("ERROR_CODE regex should compile")
});

const COMPROMISE_PHRASES: &[&str] = &[
    "hacked",
    "compromised",
    "stolen",
    "unauthorized",
    "someone else",
    "not me",
    "didn't authorize",
    "breach",
    "identity theft",
    "phishing",
];

const QUESTION_PHRASES: &[&str] = &[
    "how do i",
    "how can i",
    "how to",
    "what is",
    "where can",
    "when will",
    "is there a way",
];

const URGENCY_WORDS: &[&str] = &["urgent", "asap", "immediately", "critical", "emergency"];

/// Score adjustment produced by one heuristic.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicHit {
    pub category: Category,
    pub label: &'static str,
    pub bonus: f64,
}

/// Evaluate every heuristic.
///
/// `raw_lower` is the lower-cased ticket text, `normalized` its
/// [`normalize`](crate::retrieval::terms::normalize)d form.
pub fn evaluate(raw_lower: &str, normalized: &str) -> Vec<HeuristicHit> {
    let mut hits = Vec::new();

    if MONETARY_AMOUNT.is_match(raw_lower) {
        hits.push(HeuristicHit {
            category: Category::Billing,
            label: "monetary_amount",
            bonus: 2.0,
        });
    }

    if COMPROMISE_PHRASES
        .iter()
        .any(|p| contains_phrase(normalized, p))
    {
        hits.push(HeuristicHit {
            category: Category::Security,
            label: "compromised_credentials",
            bonus: 3.0,
        });
    }

    if ERROR_CODE.is_match(raw_lower) {
        hits.push(HeuristicHit {
            category: Category::Technical,
            label: "error_code",
            bonus: 2.5,
        });
    }

    if QUESTION_PHRASES
        .iter()
        .any(|p| contains_phrase(normalized, p))
    {
        hits.push(HeuristicHit {
            category: Category::General,
            label: "how_to_question",
            bonus: 1.5,
        });
    }

    if URGENCY_WORDS.iter().any(|w| contains_phrase(normalized, w)) {
        hits.push(HeuristicHit {
            category: Category::Technical,
            label: "urgency",
            bonus: 1.0,
        });
        hits.push(HeuristicHit {
            category: Category::Security,
            label: "urgency",
            bonus: 1.0,
        });
    }

    hits
}
