//! Reviewer Policy — five-criterion quality gate
//!
//! A draft is approved only when every criterion passes. A rejection carries
//! structured feedback that names each failed criterion and why; the drafter
//! receives it verbatim as correction instructions on the next attempt.
//!
//! # Feedback format
//!
//! ```text
//! REJECTED: 2 of 5 criteria failed
//! - helpfulness: only one actionable step
//! - completeness: no follow-up path offered
//! Notes: mention the refund timeline
//! ```

use serde::{Deserialize, Serialize};

/// Feedback used when the evaluation backend could not be reached.
pub const UNVERIFIED_FEEDBACK: &str = "Unable to verify quality; retry with more context.";

/// Review criteria, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewCriterion {
    /// Consistent with the retrieved documentation, no invented facts.
    Accuracy,
    /// Gives the customer concrete steps they can act on.
    Helpfulness,
    /// Courteous, empathetic and free of dismissive language.
    Professionalism,
    /// Addresses every part of the request and offers a follow-up path.
    Completeness,
    /// Respects the category's policy rules.
    PolicyCompliance,
}

impl ReviewCriterion {
    /// All criteria in evaluation order.
    pub const ALL: [ReviewCriterion; 5] = [
        Self::Accuracy,
        Self::Helpfulness,
        Self::Professionalism,
        Self::Completeness,
        Self::PolicyCompliance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accuracy => "accuracy",
            Self::Helpfulness => "helpfulness",
            Self::Professionalism => "professionalism",
            Self::Completeness => "completeness",
            Self::PolicyCompliance => "policy_compliance",
        }
    }

    /// Label used in the evaluator's line format, e.g. `POLICY_COMPLIANCE`.
    pub fn label(self) -> String {
        self.as_str().to_ascii_uppercase()
    }

    /// One-line description given to evaluators.
    pub fn description(self) -> &'static str {
        match self {
            Self::Accuracy => "the response is consistent with the provided documentation and invents no facts",
            Self::Helpfulness => "the response gives at least two concrete, actionable steps",
            Self::Professionalism => "the response acknowledges the customer's situation with empathy and stays courteous",
            Self::Completeness => "the response addresses every part of the request and gives a clear follow-up path",
            Self::PolicyCompliance => "the response follows the category policies listed above",
        }
    }

    /// Lenient parse of an evaluator label (`POLICY COMPLIANCE`, `policy-compliance`).
    pub fn parse(label: &str) -> Option<Self> {
        let key: String = label
            .trim()
            .chars()
            .filter(|c| !matches!(c, '*' | '#' | '`'))
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match key.trim_matches('_') {
            "accuracy" => Some(Self::Accuracy),
            "helpfulness" => Some(Self::Helpfulness),
            "professionalism" => Some(Self::Professionalism),
            "completeness" => Some(Self::Completeness),
            "policy_compliance" | "policy" | "compliance" => Some(Self::PolicyCompliance),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReviewCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass/fail for one criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionVerdict {
    pub criterion: ReviewCriterion,
    pub passed: bool,
    pub reason: String,
}

impl CriterionVerdict {
    pub fn pass(criterion: ReviewCriterion, reason: impl Into<String>) -> Self {
        Self {
            criterion,
            passed: true,
            reason: reason.into(),
        }
    }

    pub fn fail(criterion: ReviewCriterion, reason: impl Into<String>) -> Self {
        Self {
            criterion,
            passed: false,
            reason: reason.into(),
        }
    }
}

/// Outcome of one review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    /// One verdict per criterion, in `ReviewCriterion::ALL` order
    pub criteria: Vec<CriterionVerdict>,
    /// Free-form evaluator notes
    pub notes: Option<String>,
    /// The evaluator could not be reached; the draft is rejected unverified
    pub unavailable: bool,
}

impl ReviewVerdict {
    /// Build a verdict from whatever criteria were evaluated.
    ///
    /// Criteria without a verdict count as failed. When a criterion appears
    /// more than once, the first occurrence wins.
    pub fn from_criteria(verdicts: Vec<CriterionVerdict>, notes: Option<String>) -> Self {
        let criteria = ReviewCriterion::ALL
            .iter()
            .map(|&criterion| {
                verdicts
                    .iter()
                    .find(|v| v.criterion == criterion)
                    .cloned()
                    .unwrap_or_else(|| CriterionVerdict::fail(criterion, "no verdict given"))
            })
            .collect();
        Self {
            criteria,
            notes: notes.filter(|n| !n.trim().is_empty()),
            unavailable: false,
        }
    }

    /// Fail-closed verdict for an unreachable evaluator.
    pub fn unavailable() -> Self {
        Self {
            criteria: Vec::new(),
            notes: None,
            unavailable: true,
        }
    }

    pub fn approved(&self) -> bool {
        !self.unavailable
            && self.criteria.len() == ReviewCriterion::ALL.len()
            && self.criteria.iter().all(|c| c.passed)
    }

    pub fn failed(&self) -> Vec<&CriterionVerdict> {
        self.criteria.iter().filter(|c| !c.passed).collect()
    }

    /// Structured correction feedback; `None` when approved.
    pub fn feedback(&self) -> Option<String> {
        if self.approved() {
            return None;
        }
        if self.unavailable {
            return Some(UNVERIFIED_FEEDBACK.to_string());
        }
        let failed = self.failed();
        let mut out = format!(
            "REJECTED: {} of {} criteria failed",
            failed.len(),
            ReviewCriterion::ALL.len()
        );
        for verdict in failed {
            out.push_str(&format!("\n- {}: {}", verdict.criterion, verdict.reason));
        }
        if let Some(notes) = &self.notes {
            out.push_str(&format!("\nNotes: {}", notes.trim()));
        }
        Some(out)
    }
}

/// Parse evaluator output in the line format
/// `ACCURACY: PASS - reason` with optional trailing `FEEDBACK:` notes.
///
/// Returns `None` when no criterion line is recognisable, which callers
/// treat as an unavailable review. A `DECISION:` line is ignored; the
/// per-criterion verdicts are authoritative.
pub fn parse_review_output(output: &str) -> Option<ReviewVerdict> {
    let mut verdicts = Vec::new();
    let mut notes: Vec<String> = Vec::new();
    let mut in_notes = false;

    for raw in output.lines() {
        let line = raw
            .trim()
            .trim_start_matches(|c: char| c == '-' || c == '*' || c.is_ascii_digit() || c == '.')
            .trim();
        if line.is_empty() {
            continue;
        }
        let Some((head, rest)) = line.split_once(':') else {
            if in_notes {
                notes.push(line.to_string());
            }
            continue;
        };

        if head.trim().trim_matches('*').eq_ignore_ascii_case("feedback") {
            in_notes = true;
            let first = rest.trim();
            if !first.is_empty() {
                notes.push(first.to_string());
            }
            continue;
        }

        if let Some(criterion) = ReviewCriterion::parse(head) {
            if let Some(verdict) = parse_verdict(criterion, rest) {
                in_notes = false;
                verdicts.push(verdict);
                continue;
            }
        }

        if in_notes {
            notes.push(line.to_string());
        }
    }

    if verdicts.is_empty() {
        return None;
    }
    let notes = (!notes.is_empty()).then(|| notes.join(" "));
    Some(ReviewVerdict::from_criteria(verdicts, notes))
}

fn parse_verdict(criterion: ReviewCriterion, rest: &str) -> Option<CriterionVerdict> {
    let rest = rest.trim().trim_matches('*').trim();
    let word_end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    let (word, tail) = rest.split_at(word_end);
    let passed = match word.to_ascii_uppercase().as_str() {
        "PASS" | "PASSED" | "YES" => true,
        "FAIL" | "FAILED" | "NO" => false,
        _ => return None,
    };
    let reason = tail
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ':' | '*' | '–' | '—'))
        .trim();
    let reason = match (reason.is_empty(), passed) {
        (true, true) => "meets the standard".to_string(),
        (true, false) => "did not meet the standard".to_string(),
        (false, _) => reason.to_string(),
    };
    Some(CriterionVerdict {
        criterion,
        passed,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_pass() -> Vec<CriterionVerdict> {
        ReviewCriterion::ALL
            .iter()
            .map(|&c| CriterionVerdict::pass(c, "ok"))
            .collect()
    }

    #[test]
    fn test_all_pass_is_approved() {
        let verdict = ReviewVerdict::from_criteria(all_pass(), None);
        assert!(verdict.approved());
        assert_eq!(verdict.feedback(), None);
    }

    #[test]
    fn test_single_failure_rejects_with_structured_feedback() {
        let mut verdicts = all_pass();
        verdicts[3] = CriterionVerdict::fail(ReviewCriterion::Completeness, "no follow-up path");
        let verdict = ReviewVerdict::from_criteria(verdicts, Some("add contact info".into()));
        assert!(!verdict.approved());
        assert_eq!(
            verdict.feedback().unwrap(),
            "REJECTED: 1 of 5 criteria failed\n- completeness: no follow-up path\nNotes: add contact info"
        );
    }

    #[test]
    fn test_missing_criteria_count_as_failed() {
        let verdict = ReviewVerdict::from_criteria(
            vec![CriterionVerdict::pass(ReviewCriterion::Accuracy, "fine")],
            None,
        );
        assert_eq!(verdict.criteria.len(), 5);
        assert_eq!(verdict.failed().len(), 4);
        assert!(!verdict.approved());
    }

    #[test]
    fn test_unavailable_is_rejected_with_generic_feedback() {
        let verdict = ReviewVerdict::unavailable();
        assert!(!verdict.approved());
        assert_eq!(verdict.feedback().unwrap(), UNVERIFIED_FEEDBACK);
    }

    #[test]
    fn test_parse_full_output() {
        let output = "DECISION: REJECTED\n\
ACCURACY: PASS - matches the refund policy\n\
HELPFULNESS: FAIL - only one step given\n\
**Professionalism**: PASS\n\
COMPLETENESS: PASS - covers both questions\n\
POLICY COMPLIANCE: FAIL – promises a refund\n\
FEEDBACK: Do not guarantee the refund.\n\
Explain the 3-5 day timeline.";
        let verdict = parse_review_output(output).unwrap();
        assert!(!verdict.approved());
        let failed: Vec<_> = verdict.failed().iter().map(|v| v.criterion).collect();
        assert_eq!(
            failed,
            vec![ReviewCriterion::Helpfulness, ReviewCriterion::PolicyCompliance]
        );
        assert_eq!(verdict.criteria[4].reason, "promises a refund");
        assert_eq!(verdict.criteria[2].reason, "meets the standard");
        assert_eq!(
            verdict.notes.as_deref(),
            Some("Do not guarantee the refund. Explain the 3-5 day timeline.")
        );
    }

    #[test]
    fn test_parse_ignores_decision_line() {
        let output = "DECISION: APPROVED\nACCURACY: PASS\nHELPFULNESS: PASS";
        let verdict = parse_review_output(output).unwrap();
        assert!(!verdict.approved(), "missing criteria must fail");
    }

    #[test]
    fn test_parse_unrecognisable_output() {
        assert!(parse_review_output("Looks good to me!").is_none());
        assert!(parse_review_output("").is_none());
        assert!(parse_review_output("ACCURACY: maybe").is_none());
    }

    #[test]
    fn test_criterion_parse_variants() {
        assert_eq!(
            ReviewCriterion::parse("policy-compliance"),
            Some(ReviewCriterion::PolicyCompliance)
        );
        assert_eq!(
            ReviewCriterion::parse(" **ACCURACY** "),
            Some(ReviewCriterion::Accuracy)
        );
        assert_eq!(ReviewCriterion::parse("tone"), None);
        assert_eq!(ReviewCriterion::PolicyCompliance.label(), "POLICY_COMPLIANCE");
    }
}
