//! Ticket classifier — keyword, pattern and heuristic scoring.
//!
//! Runs once per ticket, before any retrieval. Never fails: ambiguous input
//! still yields a best-effort category with a low confidence.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::profile::profile;
use crate::retrieval::terms::{contains_phrase, normalize};
use crate::router::heuristics;
use crate::ticket::Category;

const TIE_EPSILON: f64 = 1e-9;

/// Compiled `(category, label, regex)` for every profile pattern.
static COMPILED_PATTERNS: LazyLock<Vec<(Category, &'static str, Regex)>> = LazyLock::new(|| {
    Category::ALL
        .iter()
        .flat_map(|&cat| {
            profile(cat).patterns.iter().map(move |(label, pattern)| {
                let re = Regex::new(pattern).expect("category pattern should compile");
                (cat, *label, re)
            })
        })
        .collect()
});

/// Tunable weights and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Weight of a matched primary keyword
    pub primary_weight: f64,
    /// Weight of a matched secondary keyword
    pub secondary_weight: f64,
    /// Multiplier applied to the normalized keyword score
    pub keyword_scale: f64,
    /// Fixed bonus for each matched pattern
    pub pattern_weight: f64,
    /// Top score below this forces the `general` fallback
    pub min_score: f64,
    /// Confidence below this is reported as ambiguous
    pub confidence_threshold: f64,
    /// Confidence ceiling when the fallback is used
    pub fallback_confidence: f64,
    /// Tie-break order, highest priority first
    pub tie_break: Vec<Category>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            primary_weight: 2.0,
            secondary_weight: 1.0,
            keyword_scale: 10.0,
            pattern_weight: 3.0,
            min_score: 1.0,
            confidence_threshold: 0.4,
            fallback_confidence: 0.2,
            tie_break: vec![
                Category::Security,
                Category::Billing,
                Category::Technical,
                Category::General,
            ],
        }
    }
}

/// Classifier output. Produced once per ticket and never re-evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    /// Normalized margin between the top score and the runner-up, in [0, 1]
    pub confidence: f64,
    /// Fired signals as `<category>:<kind>:<label>`, in evaluation order
    pub matched_signals: Vec<String>,
    /// Combined score per category
    pub scores: BTreeMap<Category, f64>,
    /// Whether the no-signal fallback picked the category
    pub fallback_used: bool,
    /// Whether the tie-break order decided the category
    pub tie_broken: bool,
    /// Ambiguity threshold the result was judged against
    pub confidence_threshold: f64,
    pub reasoning: String,
}

impl ClassificationResult {
    /// Confidence fell below the configured threshold.
    pub fn is_ambiguous(&self) -> bool {
        self.confidence < self.confidence_threshold
    }

    /// Compact summary for logging.
    pub fn summary(&self) -> String {
        format!(
            "category={} confidence={:.2} signals={}{}",
            self.category,
            self.confidence,
            self.matched_signals.len(),
            if self.fallback_used { " fallback" } else { "" }
        )
    }
}

/// Multi-signal ticket classifier.
#[derive(Debug, Clone, Default)]
pub struct TicketClassifier {
    config: ClassifierConfig,
}

impl TicketClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify a ticket from its subject and description.
    pub fn classify(&self, subject: &str, description: &str) -> ClassificationResult {
        let raw_lower = format!("{subject} {description}").to_lowercase();
        let normalized = normalize(&raw_lower);

        let mut scores: BTreeMap<Category, f64> =
            Category::ALL.iter().map(|&c| (c, 0.0)).collect();
        let mut signals = Vec::new();

        // ── Keywords ─────────────────────────────────────────────────────────
        for cat in Category::ALL {
            let p = profile(cat);
            let mut weighted = 0.0;
            for kw in p.primary_keywords {
                if contains_phrase(&normalized, kw) {
                    weighted += self.config.primary_weight;
                    signals.push(format!("{cat}:keyword:{kw}"));
                }
            }
            for kw in p.secondary_keywords {
                if contains_phrase(&normalized, kw) {
                    weighted += self.config.secondary_weight;
                    signals.push(format!("{cat}:keyword:{kw}"));
                }
            }
            if weighted > 0.0 && p.keyword_count() > 0 {
                *scores.entry(cat).or_default() +=
                    self.config.keyword_scale * weighted / p.keyword_count() as f64;
            }
        }

        // ── Patterns ─────────────────────────────────────────────────────────
        for (cat, label, re) in COMPILED_PATTERNS.iter() {
            if re.is_match(&raw_lower) {
                *scores.entry(*cat).or_default() += self.config.pattern_weight;
                signals.push(format!("{cat}:pattern:{label}"));
            }
        }

        // ── Heuristics ───────────────────────────────────────────────────────
        for hit in heuristics::evaluate(&raw_lower, &normalized) {
            *scores.entry(hit.category).or_default() += hit.bonus;
            signals.push(format!("{}:heuristic:{}", hit.category, hit.label));
        }

        let result = self.decide(scores, signals);
        debug!(
            category = %result.category,
            confidence = result.confidence,
            signals = result.matched_signals.len(),
            "Ticket classified"
        );
        result
    }

    /// Pick the winner, apply tie-break and fallback, compute confidence.
    fn decide(
        &self,
        scores: BTreeMap<Category, f64>,
        matched_signals: Vec<String>,
    ) -> ClassificationResult {
        let order = self.priority_order();

        let mut top = order[0];
        let mut top_score = f64::MIN;
        for &cat in &order {
            let s = scores.get(&cat).copied().unwrap_or(0.0);
            if s > top_score + TIE_EPSILON {
                top = cat;
                top_score = s;
            }
        }

        let runner_up = order
            .iter()
            .filter(|&&c| c != top)
            .map(|c| scores.get(c).copied().unwrap_or(0.0))
            .fold(0.0_f64, f64::max);
        let tie_broken = (top_score - runner_up).abs() <= TIE_EPSILON && top_score > 0.0;

        if top_score < self.config.min_score {
            let margin = margin(top_score, runner_up);
            return ClassificationResult {
                category: Category::General,
                confidence: margin.min(self.config.fallback_confidence),
                matched_signals,
                scores,
                fallback_used: true,
                tie_broken: false,
                confidence_threshold: self.config.confidence_threshold,
                reasoning: format!(
                    "No category reached the minimum score {:.1} (best {:.2}); defaulting to general",
                    self.config.min_score, top_score
                ),
            };
        }

        ClassificationResult {
            category: top,
            confidence: margin(top_score, runner_up),
            matched_signals,
            reasoning: format!(
                "Classified as {top} (score {top_score:.2}, runner-up {runner_up:.2}{})",
                if tie_broken { ", tie broken by priority" } else { "" }
            ),
            scores,
            fallback_used: false,
            tie_broken,
            confidence_threshold: self.config.confidence_threshold,
        }
    }

    /// Configured tie-break order, completed with any category it omits.
    fn priority_order(&self) -> Vec<Category> {
        let mut order: Vec<Category> = Vec::with_capacity(Category::ALL.len());
        for &cat in self.config.tie_break.iter().chain(Category::ALL.iter()) {
            if !order.contains(&cat) {
                order.push(cat);
            }
        }
        order
    }
}

fn margin(top: f64, runner_up: f64) -> f64 {
    if top <= 0.0 {
        return 0.0;
    }
    ((top - runner_up) / top).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(subject: &str, description: &str) -> ClassificationResult {
        TicketClassifier::new().classify(subject, description)
    }

    #[test]
    fn test_login_ticket_is_technical_with_high_confidence() {
        let r = classify(
            "Cannot login to my account",
            "I keep getting invalid credentials error even though my password is correct",
        );
        assert_eq!(r.category, Category::Technical, "{}", r.reasoning);
        assert!(r.confidence > 0.6, "confidence {}", r.confidence);
        assert!(!r.is_ambiguous());
        assert!(r
            .matched_signals
            .contains(&"technical:pattern:invalid credentials".to_string()));
        assert!(r
            .matched_signals
            .contains(&"technical:keyword:login".to_string()));
    }

    #[test]
    fn test_double_charge_is_billing_without_tie_break() {
        let r = classify(
            "Double charged this month",
            "I was charged $29.99 twice for my monthly subscription. Can you help me get a refund for the duplicate charge?",
        );
        assert_eq!(r.category, Category::Billing);
        assert!(!r.tie_broken);
        assert!(r
            .matched_signals
            .contains(&"billing:heuristic:monetary_amount".to_string()));
        assert!(r
            .matched_signals
            .contains(&"billing:pattern:charged twice".to_string()));
    }

    #[test]
    fn test_no_signal_falls_back_to_general() {
        let r = classify("Hello there", "Lorem ipsum dolor sit amet consectetur");
        assert_eq!(r.category, Category::General);
        assert!(r.fallback_used);
        assert!(r.matched_signals.is_empty());
        assert!(r.confidence < r.confidence_threshold);
        assert!(r.is_ambiguous());
    }

    #[test]
    fn test_compromised_account_is_security() {
        let r = classify(
            "Password reset not working",
            "I forgot my password and tried to reset it, but I'm not receiving the reset email. My account might be compromised.",
        );
        assert_eq!(r.category, Category::Security, "{}", r.reasoning);
    }

    #[test]
    fn test_sample_tickets() {
        let cases = [
            (
                "Refund request for overcharge",
                "I was charged $199 instead of $99 for my subscription. Please process a refund for the difference.",
                Category::Billing,
            ),
            (
                "Login error 403",
                "I'm getting error code 403 when trying to log in. The app worked fine yesterday but now it's broken.",
                Category::Technical,
            ),
            (
                "Mobile app keeps crashing",
                "The mobile app crashes every time I try to open the reports section after the latest update.",
                Category::Technical,
            ),
            (
                "Suspicious login activity",
                "I received an email saying someone logged into my account from another country. I'm worried my account has been compromised. Please help immediately!",
                Category::Security,
            ),
            (
                "Question about premium features",
                "I'm interested in upgrading to premium. Can you tell me what additional features I would get?",
                Category::General,
            ),
            (
                "How to export my data?",
                "I need to export all my data for backup purposes. Is there a way to do bulk data export?",
                Category::General,
            ),
        ];
        for (subject, description, expected) in cases {
            let r = classify(subject, description);
            assert_eq!(r.category, expected, "{subject}: {}", r.reasoning);
        }
    }

    #[test]
    fn test_tie_break_prefers_security() {
        let classifier = TicketClassifier::new();
        let scores: BTreeMap<Category, f64> = [
            (Category::Billing, 4.0),
            (Category::Technical, 1.0),
            (Category::Security, 4.0),
            (Category::General, 0.0),
        ]
        .into_iter()
        .collect();
        let r = classifier.decide(scores, vec![]);
        assert_eq!(r.category, Category::Security);
        assert!(r.tie_broken);
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn test_custom_tie_break_order() {
        let classifier = TicketClassifier::with_config(ClassifierConfig {
            tie_break: vec![Category::Billing],
            ..Default::default()
        });
        let scores: BTreeMap<Category, f64> =
            [(Category::Billing, 3.0), (Category::Security, 3.0)]
                .into_iter()
                .collect();
        let r = classifier.decide(scores, vec![]);
        assert_eq!(r.category, Category::Billing);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let r = classify(
            "Billing question",
            "My invoice shows a payment charge I do not recognise, billing issue $12.00",
        );
        assert!((0.0..=1.0).contains(&r.confidence));
        assert_eq!(r.category, Category::Billing);
    }

    #[test]
    fn test_weak_signal_below_min_score_falls_back() {
        let classifier = TicketClassifier::with_config(ClassifierConfig {
            min_score: 50.0,
            ..Default::default()
        });
        let r = classifier.classify("Refund", "Please refund my subscription payment");
        assert_eq!(r.category, Category::General);
        assert!(r.fallback_used);
        assert!(r.confidence <= 0.2);
        assert!(!r.matched_signals.is_empty());
    }
}
