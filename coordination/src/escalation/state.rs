//! Ticket State — attempt history and lifecycle of one ticket

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{FailureKind, StateError};
use crate::retrieval::retriever::RetrievalContext;
use crate::reviewer_policy::CriterionVerdict;
use crate::router::classifier::ClassificationResult;
use crate::ticket::{Category, Ticket};

/// Default retry ceiling.
pub const MAX_ATTEMPTS: u32 = 3;

/// Lifecycle status. Only `Processing` is non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Processing,
    Resolved,
    Escalated,
    /// Stopped by the caller between attempts
    Cancelled,
}

impl TicketStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Processing)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Resolved => write!(f, "resolved"),
            Self::Escalated => write!(f, "escalated"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Sub-phase while `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Classifying,
    Retrieving,
    Drafting,
    Reviewing,
    /// Terminal status reached
    Done,
}

impl Phase {
    /// Phase that legally follows this one inside an attempt.
    fn next(self) -> Option<Phase> {
        match self {
            Self::Classifying => Some(Self::Retrieving),
            Self::Retrieving => Some(Self::Drafting),
            Self::Drafting => Some(Self::Reviewing),
            Self::Reviewing | Self::Done => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classifying => write!(f, "classifying"),
            Self::Retrieving => write!(f, "retrieving"),
            Self::Drafting => write!(f, "drafting"),
            Self::Reviewing => write!(f, "reviewing"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Reviewer decision for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    Approved,
    Rejected,
}

impl std::fmt::Display for ReviewOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// One pass through retrieve, draft and review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based, sequential
    pub attempt_number: u32,
    pub context_used: RetrievalContext,
    pub draft_text: String,
    pub review_outcome: ReviewOutcome,
    /// Correction feedback; `None` when approved
    pub feedback: Option<String>,
    /// Per-criterion verdicts (empty when the review was unavailable)
    pub criteria: Vec<CriterionVerdict>,
    /// Draft is the category fallback text
    pub draft_degraded: bool,
    /// Review failed closed
    pub review_degraded: bool,
    /// Retrieval failed and the attempt ran with no documents
    pub corpus_degraded: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Attempt {
    pub fn approved(&self) -> bool {
        self.review_outcome == ReviewOutcome::Approved
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Working state of one ticket, owned exclusively by its orchestration.
///
/// Attempts are append-only; no method rewrites a recorded attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketState {
    ticket: Ticket,
    classification: Option<ClassificationResult>,
    attempt_history: Vec<Attempt>,
    status: TicketStatus,
    phase: Phase,
    max_attempts: u32,
    /// Distinct degradations observed, in first-seen order
    degradations: Vec<FailureKind>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl TicketState {
    pub fn new(ticket: Ticket, max_attempts: u32) -> Self {
        Self {
            ticket,
            classification: None,
            attempt_history: Vec::new(),
            status: TicketStatus::Processing,
            phase: Phase::Classifying,
            max_attempts: max_attempts.max(1),
            degradations: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn classification(&self) -> Option<&ClassificationResult> {
        self.classification.as_ref()
    }

    /// Classified category, `general` before classification.
    pub fn category(&self) -> Category {
        self.classification
            .as_ref()
            .map_or(Category::General, |c| c.category)
    }

    pub fn confidence(&self) -> f64 {
        self.classification.as_ref().map_or(0.0, |c| c.confidence)
    }

    pub fn attempt_history(&self) -> &[Attempt] {
        &self.attempt_history
    }

    pub fn attempts(&self) -> u32 {
        self.attempt_history.len() as u32
    }

    pub fn status(&self) -> TicketStatus {
        self.status
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn degradations(&self) -> &[FailureKind] {
        &self.degradations
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn next_attempt_number(&self) -> u32 {
        self.attempts() + 1
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts())
    }

    pub fn last_attempt(&self) -> Option<&Attempt> {
        self.attempt_history.last()
    }

    /// Feedback of the most recent attempt, used as the next correction.
    pub fn last_feedback(&self) -> Option<&str> {
        self.last_attempt().and_then(|a| a.feedback.as_deref())
    }

    /// Context of the most recent attempt, the floor for the next retrieval.
    pub fn last_context(&self) -> Option<&RetrievalContext> {
        self.last_attempt().map(|a| &a.context_used)
    }

    /// Store the classifier result. Allowed exactly once.
    pub fn record_classification(
        &mut self,
        classification: ClassificationResult,
    ) -> Result<(), StateError> {
        self.ensure_processing()?;
        if self.phase != Phase::Classifying {
            return Err(self.phase_error(Phase::Retrieving));
        }
        if classification.is_ambiguous() {
            self.record_degradation(FailureKind::ClassificationAmbiguous);
        }
        self.classification = Some(classification);
        self.phase = Phase::Retrieving;
        Ok(())
    }

    /// Advance to the next sub-phase of the current attempt.
    pub fn enter_phase(&mut self, phase: Phase) -> Result<(), StateError> {
        self.ensure_processing()?;
        if self.classification.is_none() {
            return Err(StateError::Unclassified {
                ticket_id: self.ticket.id().to_string(),
            });
        }
        if self.phase == phase {
            return Ok(());
        }
        if self.phase.next() != Some(phase) {
            return Err(self.phase_error(phase));
        }
        self.phase = phase;
        Ok(())
    }

    /// Append a completed attempt.
    pub fn record_attempt(&mut self, attempt: Attempt) -> Result<(), StateError> {
        self.ensure_processing()?;
        if self.classification.is_none() {
            return Err(StateError::Unclassified {
                ticket_id: self.ticket.id().to_string(),
            });
        }
        if self.attempts() >= self.max_attempts {
            return Err(StateError::BudgetExhausted {
                ticket_id: self.ticket.id().to_string(),
                max: self.max_attempts,
            });
        }
        let expected = self.next_attempt_number();
        if attempt.attempt_number != expected {
            return Err(StateError::OutOfSequence {
                expected,
                got: attempt.attempt_number,
            });
        }
        if attempt.corpus_degraded {
            self.record_degradation(FailureKind::CorpusUnavailable);
        }
        if attempt.draft_degraded {
            self.record_degradation(FailureKind::GenerationUnavailable);
        }
        if attempt.review_degraded {
            self.record_degradation(FailureKind::ReviewUnavailable);
        }
        self.attempt_history.push(attempt);
        self.phase = Phase::Retrieving;
        Ok(())
    }

    pub fn resolve(&mut self) -> Result<(), StateError> {
        self.finish(TicketStatus::Resolved)
    }

    pub fn escalate(&mut self) -> Result<(), StateError> {
        if self.attempts() >= self.max_attempts {
            self.record_degradation(FailureKind::RetryBudgetExhausted);
        }
        self.finish(TicketStatus::Escalated)
    }

    pub fn cancel(&mut self) -> Result<(), StateError> {
        self.finish(TicketStatus::Cancelled)
    }

    /// Note a degradation once, keeping first-seen order.
    pub fn record_degradation(&mut self, kind: FailureKind) {
        if !self.degradations.contains(&kind) {
            self.degradations.push(kind);
        }
    }

    fn finish(&mut self, status: TicketStatus) -> Result<(), StateError> {
        self.ensure_processing()?;
        self.status = status;
        self.phase = Phase::Done;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn ensure_processing(&self) -> Result<(), StateError> {
        if self.status.is_terminal() {
            return Err(StateError::AlreadyTerminal {
                ticket_id: self.ticket.id().to_string(),
                status: self.status.to_string(),
            });
        }
        Ok(())
    }

    fn phase_error(&self, to: Phase) -> StateError {
        StateError::PhaseOrder {
            from: self.phase.to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::router::classifier::TicketClassifier;
    use std::collections::BTreeSet;

    pub(crate) fn classified_state() -> TicketState {
        let ticket = Ticket::new(
            "Cannot login to my account",
            "I keep getting invalid credentials error even though my password is correct",
        )
        .unwrap();
        let classification = TicketClassifier::new().classify(ticket.subject(), ticket.description());
        let mut state = TicketState::new(ticket, MAX_ATTEMPTS);
        state.record_classification(classification).unwrap();
        state
    }

    pub(crate) fn attempt(n: u32, approved: bool) -> Attempt {
        let now = Utc::now();
        Attempt {
            attempt_number: n,
            context_used: RetrievalContext::empty(Category::Technical, BTreeSet::new(), n),
            draft_text: format!("draft {n}"),
            review_outcome: if approved {
                ReviewOutcome::Approved
            } else {
                ReviewOutcome::Rejected
            },
            feedback: (!approved).then(|| format!("feedback {n}")),
            criteria: Vec::new(),
            draft_degraded: false,
            review_degraded: false,
            corpus_degraded: false,
            started_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn test_new_state_is_processing() {
        let state = classified_state();
        assert_eq!(state.status(), TicketStatus::Processing);
        assert_eq!(state.phase(), Phase::Retrieving);
        assert_eq!(state.category(), Category::Technical);
        assert_eq!(state.next_attempt_number(), 1);
        assert_eq!(state.attempts_remaining(), 3);
    }

    #[test]
    fn test_phases_advance_in_order() {
        let mut state = classified_state();
        state.enter_phase(Phase::Drafting).unwrap();
        state.enter_phase(Phase::Reviewing).unwrap();
        assert!(matches!(
            state.enter_phase(Phase::Drafting),
            Err(StateError::PhaseOrder { .. })
        ));
        state.record_attempt(attempt(1, false)).unwrap();
        assert_eq!(state.phase(), Phase::Retrieving);
    }

    #[test]
    fn test_unclassified_state_rejects_attempts() {
        let ticket = Ticket::new("Subject line", "A long enough description").unwrap();
        let mut state = TicketState::new(ticket, 3);
        assert!(matches!(
            state.record_attempt(attempt(1, true)),
            Err(StateError::Unclassified { .. })
        ));
        assert!(matches!(
            state.enter_phase(Phase::Drafting),
            Err(StateError::Unclassified { .. })
        ));
    }

    #[test]
    fn test_attempts_must_be_sequential() {
        let mut state = classified_state();
        assert_eq!(
            state.record_attempt(attempt(2, false)).unwrap_err(),
            StateError::OutOfSequence {
                expected: 1,
                got: 2
            }
        );
    }

    #[test]
    fn test_budget_is_enforced() {
        let mut state = classified_state();
        for n in 1..=3 {
            state.record_attempt(attempt(n, false)).unwrap();
        }
        assert!(matches!(
            state.record_attempt(attempt(4, false)),
            Err(StateError::BudgetExhausted { max: 3, .. })
        ));
        assert_eq!(state.attempts(), 3);
        assert_eq!(state.last_feedback(), Some("feedback 3"));
    }

    #[test]
    fn test_terminal_status_is_final() {
        let mut state = classified_state();
        state.record_attempt(attempt(1, true)).unwrap();
        state.resolve().unwrap();
        assert_eq!(state.phase(), Phase::Done);
        assert!(state.finished_at().is_some());
        assert!(matches!(
            state.escalate(),
            Err(StateError::AlreadyTerminal { .. })
        ));
        assert!(matches!(
            state.record_attempt(attempt(2, true)),
            Err(StateError::AlreadyTerminal { .. })
        ));
        assert_eq!(state.status(), TicketStatus::Resolved);
    }

    #[test]
    fn test_degradations_are_deduplicated() {
        let mut state = classified_state();
        let mut a = attempt(1, false);
        a.draft_degraded = true;
        a.review_degraded = true;
        state.record_attempt(a).unwrap();
        let mut b = attempt(2, false);
        b.draft_degraded = true;
        state.record_attempt(b).unwrap();
        state.record_attempt(attempt(3, false)).unwrap();
        state.escalate().unwrap();
        assert_eq!(
            state.degradations(),
            &[
                FailureKind::GenerationUnavailable,
                FailureKind::ReviewUnavailable,
                FailureKind::RetryBudgetExhausted
            ]
        );
    }

    #[test]
    fn test_max_attempts_floor_is_one() {
        let ticket = Ticket::new("Subject line", "A long enough description").unwrap();
        assert_eq!(TicketState::new(ticket, 0).max_attempts(), 1);
    }
}
