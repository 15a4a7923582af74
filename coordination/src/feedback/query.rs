//! Feedback-driven query augmentation.
//!
//! Reviewer feedback names what a draft was missing. Its content terms are
//! added to the retrieval query so later attempts search for exactly that.

use std::collections::BTreeSet;

use crate::retrieval::terms::content_terms;

/// Review vocabulary that says nothing about the ticket's subject matter.
/// Sorted for binary search.
const REVIEW_VOCABULARY: &[&str] = &[
    "accuracy",
    "acknowledge",
    "actionable",
    "address",
    "addressed",
    "approved",
    "check",
    "complete",
    "completeness",
    "compliance",
    "context",
    "criteria",
    "criterion",
    "customer",
    "draft",
    "fail",
    "failed",
    "feedback",
    "generic",
    "helpful",
    "helpfulness",
    "improve",
    "improvement",
    "include",
    "issue",
    "lacks",
    "mention",
    "missing",
    "must",
    "needs",
    "pass",
    "passed",
    "policy",
    "professional",
    "professionalism",
    "provide",
    "quality",
    "reason",
    "rejected",
    "response",
    "retry",
    "revise",
    "steps",
    "ticket",
    "unable",
    "verify",
    "words",
];

/// Content terms of reviewer feedback, minus review vocabulary.
pub fn feedback_terms(feedback: &str) -> BTreeSet<String> {
    content_terms(feedback)
        .into_iter()
        .filter(|t| REVIEW_VOCABULARY.binary_search(&t.as_str()).is_err())
        .collect()
}

/// Retrieval query that only ever grows across attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTerms {
    terms: BTreeSet<String>,
    /// Terms contributed by feedback, in the order they were added
    from_feedback: Vec<String>,
}

impl QueryTerms {
    /// Seed the query from the ticket text.
    pub fn from_ticket_text(text: &str) -> Self {
        Self {
            terms: content_terms(text),
            from_feedback: Vec::new(),
        }
    }

    /// Add the terms of one round of feedback. Returns how many were new.
    pub fn augment(&mut self, feedback: &str) -> usize {
        let mut added = 0;
        for term in feedback_terms(feedback) {
            if self.terms.insert(term.clone()) {
                self.from_feedback.push(term);
                added += 1;
            }
        }
        added
    }

    pub fn terms(&self) -> &BTreeSet<String> {
        &self.terms
    }

    pub fn feedback_terms(&self) -> &[String] {
        &self.from_feedback
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
