//! Rule pack — deterministic draft evaluation, one rule set per criterion.
//!
//! The independent evaluation routine used when no evaluation backend is
//! configured, and the reference the LLM evaluator is tested against.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::profile::profile;
use crate::retrieval::retriever::RetrievalContext;
use crate::retrieval::terms::{content_terms, contains_phrase, normalize};
use crate::reviewer_policy::{CriterionVerdict, ReviewCriterion, ReviewVerdict};
use crate::ticket::{Category, Ticket};

const EMPATHY_MARKERS: &[&str] = &[
    "sorry",
    "apologize",
    "apologise",
    "understand",
    "thank you",
    "thanks for",
    "appreciate",
    "frustrating",
];

const UNPROFESSIONAL_MARKERS: &[&str] = &[
    "stupid",
    "idiot",
    "dumb",
    "whatever",
    "your fault",
    "calm down",
    "obviously",
    "not our problem",
    "lol",
];

const FOLLOW_UP_MARKERS: &[&str] = &[
    "contact",
    "reach out",
    "let us know",
    "let me know",
    "follow up",
    "reply",
    "anything else",
    "get back to you",
];

const ACTION_VERBS: &[&str] = &[
    "check", "clear", "click", "confirm", "contact", "disable", "download", "enable", "enter",
    "go", "install", "log", "navigate", "open", "reinstall", "request", "reset", "restart",
    "review", "select", "sign", "submit", "try", "update", "use", "verify", "visit",
];

/// Thresholds for the deterministic evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicThresholds {
    /// Minimum draft length in words
    pub min_words: usize,
    /// Minimum count of numbered, bulleted or imperative steps
    pub min_actionable_steps: usize,
    /// Minimum content terms shared between draft and retrieved documents
    pub min_grounding_terms: usize,
    /// Minimum fraction of subject terms the draft must mention
    pub min_subject_coverage: f64,
}

impl Default for HeuristicThresholds {
    fn default() -> Self {
        Self {
            min_words: 40,
            min_actionable_steps: 2,
            min_grounding_terms: 2,
            min_subject_coverage: 0.5,
        }
    }
}

/// Deterministic five-criterion evaluator.
#[derive(Debug, Clone, Default)]
pub struct HeuristicEvaluator {
    thresholds: HeuristicThresholds,
}

impl HeuristicEvaluator {
    pub fn new(thresholds: HeuristicThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &HeuristicThresholds {
        &self.thresholds
    }

    /// Evaluate `draft` for `ticket` against the documents it was drafted from.
    pub fn evaluate(
        &self,
        ticket: &Ticket,
        category: Category,
        draft: &str,
        context: &RetrievalContext,
    ) -> ReviewVerdict {
        let normalized = normalize(draft);
        let draft_terms = content_terms(draft);
        let verdicts = vec![
            self.accuracy(&draft_terms, context),
            self.helpfulness(draft),
            professionalism(&normalized),
            self.completeness(ticket, &draft_terms, &normalized),
            policy_compliance(category, &normalized),
        ];
        ReviewVerdict::from_criteria(verdicts, None)
    }

    fn accuracy(&self, draft_terms: &BTreeSet<String>, context: &RetrievalContext) -> CriterionVerdict {
        let criterion = ReviewCriterion::Accuracy;
        if context.is_empty() {
            return CriterionVerdict::fail(criterion, "no documentation was available to ground the response");
        }
        let doc_terms: BTreeSet<String> = context
            .documents
            .iter()
            .flat_map(|d| content_terms(&format!("{} {}", d.title, d.body)))
            .collect();
        let shared = draft_terms.intersection(&doc_terms).count();
        if shared >= self.thresholds.min_grounding_terms {
            CriterionVerdict::pass(criterion, format!("{shared} terms grounded in the documentation"))
        } else {
            CriterionVerdict::fail(
                criterion,
                format!(
                    "response is not grounded in the documentation ({shared} shared terms, need {})",
                    self.thresholds.min_grounding_terms
                ),
            )
        }
    }

    fn helpfulness(&self, draft: &str) -> CriterionVerdict {
        let criterion = ReviewCriterion::Helpfulness;
        let words = draft.split_whitespace().count();
        if words < self.thresholds.min_words {
            return CriterionVerdict::fail(
                criterion,
                format!("response is too short ({words} words, need {})", self.thresholds.min_words),
            );
        }
        let steps = count_actionable_steps(draft);
        if steps < self.thresholds.min_actionable_steps {
            return CriterionVerdict::fail(
                criterion,
                format!(
                    "only {steps} actionable steps, need at least {}",
                    self.thresholds.min_actionable_steps
                ),
            );
        }
        CriterionVerdict::pass(criterion, format!("{steps} actionable steps"))
    }

    fn completeness(
        &self,
        ticket: &Ticket,
        draft_terms: &BTreeSet<String>,
        normalized: &str,
    ) -> CriterionVerdict {
        let criterion = ReviewCriterion::Completeness;
        let subject_terms = content_terms(ticket.subject());
        if !subject_terms.is_empty() {
            let covered = subject_terms.intersection(draft_terms).count();
            let coverage = covered as f64 / subject_terms.len() as f64;
            if coverage < self.thresholds.min_subject_coverage {
                let missing: Vec<&str> = subject_terms
                    .difference(draft_terms)
                    .map(String::as_str)
                    .collect();
                return CriterionVerdict::fail(
                    criterion,
                    format!("does not address: {}", missing.join(", ")),
                );
            }
        }
        if !FOLLOW_UP_MARKERS.iter().any(|m| contains_phrase(normalized, m)) {
            return CriterionVerdict::fail(criterion, "no follow-up path or contact option offered");
        }
        CriterionVerdict::pass(criterion, "addresses the request and offers a follow-up path")
    }
}

fn professionalism(normalized: &str) -> CriterionVerdict {
    let criterion = ReviewCriterion::Professionalism;
    if let Some(marker) = UNPROFESSIONAL_MARKERS
        .iter()
        .find(|m| contains_phrase(normalized, m))
    {
        return CriterionVerdict::fail(criterion, format!("unprofessional language: \"{marker}\""));
    }
    if !EMPATHY_MARKERS.iter().any(|m| contains_phrase(normalized, m)) {
        return CriterionVerdict::fail(criterion, "does not acknowledge the customer's situation");
    }
    CriterionVerdict::pass(criterion, "courteous and empathetic")
}

fn policy_compliance(category: Category, normalized: &str) -> CriterionVerdict {
    let criterion = ReviewCriterion::PolicyCompliance;
    let violations: Vec<&str> = profile(category)
        .forbidden_phrases
        .iter()
        .copied()
        .filter(|p| contains_phrase(normalized, p))
        .collect();
    if violations.is_empty() {
        CriterionVerdict::pass(criterion, format!("follows {category} policy"))
    } else {
        CriterionVerdict::fail(
            criterion,
            format!("violates {category} policy: \"{}\"", violations.join("\", \"")),
        )
    }
}

/// Numbered or bulleted lines, plus sentences opening with an action verb.
fn count_actionable_steps(draft: &str) -> usize {
    let mut steps = 0;
    for line in draft.lines() {
        let line = line.trim();
        let is_list_item = line.starts_with(['-', '*', '•'])
            || line
                .split_once(['.', ')'])
                .is_some_and(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
        if is_list_item {
            steps += 1;
            continue;
        }
        for sentence in line.split(['.', '!', '?', ';']) {
            let mut words = sentence
                .split_whitespace()
                .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase());
            let first = match words.next() {
                Some(w) if w == "please" || w == "then" || w == "first" || w == "next" => words.next(),
                other => other,
            };
            if first.is_some_and(|w| ACTION_VERBS.binary_search(&w.as_str()).is_ok()) {
                steps += 1;
            }
        }
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::corpus::Document;

    const GOOD_DRAFT: &str = "Thank you for reaching out, and I'm sorry the login trouble is keeping you out of your account.\n\
Here is what usually fixes an invalid credentials error:\n\
1. Check that caps lock is off and the email address on file is correct.\n\
2. Clear your browser cache and cookies, then try to log in again.\n\
3. Reset your password from the login page if the error persists.\n\
If none of this works, reply to this message or contact our technical support team and we will follow up right away.";

    fn ticket() -> Ticket {
        Ticket::new(
            "Cannot login to my account",
            "I keep getting invalid credentials error even though my password is correct",
        )
        .unwrap()
    }

    fn context() -> RetrievalContext {
        RetrievalContext {
            category: Category::Technical,
            documents: vec![Document {
                id: "technical-01".into(),
                category: Category::Technical,
                title: "Login Issues".into(),
                body: "Clear your browser cache and cookies, then reset your password. Use the correct email address.".into(),
                relevance_score: 0.5,
            }],
            expansion_level: 1,
            query_terms: BTreeSet::new(),
            corpus_version: "v".into(),
        }
    }

    #[test]
    fn test_action_verbs_sorted() {
        let mut sorted = ACTION_VERBS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, ACTION_VERBS);
    }

    #[test]
    fn test_good_draft_is_approved() {
        let verdict = HeuristicEvaluator::default().evaluate(
            &ticket(),
            Category::Technical,
            GOOD_DRAFT,
            &context(),
        );
        assert!(verdict.approved(), "{:?}", verdict.feedback());
    }

    #[test]
    fn test_short_draft_fails_helpfulness() {
        let verdict = HeuristicEvaluator::default().evaluate(
            &ticket(),
            Category::Technical,
            "Try again later.",
            &context(),
        );
        let failed: Vec<_> = verdict.failed().iter().map(|v| v.criterion).collect();
        assert!(failed.contains(&ReviewCriterion::Helpfulness));
        assert!(failed.contains(&ReviewCriterion::Professionalism));
    }

    #[test]
    fn test_empty_context_fails_accuracy() {
        let empty = RetrievalContext::empty(Category::Technical, BTreeSet::new(), 1);
        let verdict =
            HeuristicEvaluator::default().evaluate(&ticket(), Category::Technical, GOOD_DRAFT, &empty);
        assert_eq!(verdict.failed().len(), 1);
        assert_eq!(verdict.failed()[0].criterion, ReviewCriterion::Accuracy);
    }

    #[test]
    fn test_forbidden_phrase_fails_policy() {
        let draft = format!("{GOOD_DRAFT}\nWe guarantee a refund for the inconvenience.");
        let verdict =
            HeuristicEvaluator::default().evaluate(&ticket(), Category::Billing, &draft, &context());
        let failed = verdict.failed();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].criterion, ReviewCriterion::PolicyCompliance);
        assert!(failed[0].reason.contains("guarantee a refund"));
    }

    #[test]
    fn test_unprofessional_language() {
        let draft = format!("{GOOD_DRAFT}\nObviously this is your fault.");
        let verdict =
            HeuristicEvaluator::default().evaluate(&ticket(), Category::Technical, &draft, &context());
        assert_eq!(verdict.failed()[0].criterion, ReviewCriterion::Professionalism);
    }

    #[test]
    fn test_fallback_responses_are_not_approved() {
        for cat in Category::ALL {
            let verdict = HeuristicEvaluator::default().evaluate(
                &ticket(),
                cat,
                profile(cat).fallback_response,
                &context(),
            );
            assert!(!verdict.approved(), "{cat} fallback should not pass review");
        }
    }

    #[test]
    fn test_count_actionable_steps() {
        assert_eq!(count_actionable_steps("1. Open settings\n2) Click save\n- done"), 3);
        assert_eq!(count_actionable_steps("Please restart the app. Then update it."), 2);
        assert_eq!(count_actionable_steps("I understand. We are looking into it."), 0);
    }
}
