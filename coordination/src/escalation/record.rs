//! Escalation Record — the durable audit artifact handed to a human.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{FailureKind, StateError};
use crate::escalation::engine::EscalationReason;
use crate::escalation::state::{Attempt, ReviewOutcome, TicketState, TicketStatus};
use crate::profile::profile;
use crate::ticket::{Category, Priority};

/// Audit view of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt_number: u32,
    pub expansion_level: u32,
    /// Titles of the documents the draft was grounded on, in rank order
    pub context_titles: Vec<String>,
    pub context_document_ids: Vec<String>,
    pub query_terms: Vec<String>,
    pub corpus_version: String,
    pub draft_text: String,
    pub review_outcome: ReviewOutcome,
    pub feedback: Option<String>,
    pub draft_degraded: bool,
    pub review_degraded: bool,
    pub corpus_degraded: bool,
}

impl From<&Attempt> for AttemptRecord {
    fn from(a: &Attempt) -> Self {
        Self {
            attempt_number: a.attempt_number,
            expansion_level: a.context_used.expansion_level,
            context_titles: a.context_used.titles(),
            context_document_ids: a.context_used.documents.iter().map(|d| d.id.clone()).collect(),
            query_terms: a.context_used.query_terms.iter().cloned().collect(),
            corpus_version: a.context_used.corpus_version.clone(),
            draft_text: a.draft_text.clone(),
            review_outcome: a.review_outcome,
            feedback: a.feedback.clone(),
            draft_degraded: a.draft_degraded,
            review_degraded: a.review_degraded,
            corpus_degraded: a.corpus_degraded,
        }
    }
}

/// Full snapshot of an escalated (or cancelled) ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub ticket_id: String,
    pub subject: String,
    pub description: String,
    pub priority: Priority,
    pub customer_id: Option<String>,
    pub category: Category,
    pub confidence: f64,
    pub matched_signals: Vec<String>,
    /// Team that owns the category
    pub assigned_team: String,
    pub attempts: Vec<AttemptRecord>,
    pub status: TicketStatus,
    pub reason: EscalationReason,
    pub degradations: Vec<FailureKind>,
    pub escalation_message: String,
    pub timestamp: DateTime<Utc>,
}

impl EscalationRecord {
    /// Snapshot a ticket that ended `escalated` or `cancelled`.
    pub fn from_state(state: &TicketState, reason: EscalationReason) -> Result<Self, StateError> {
        if !matches!(
            state.status(),
            TicketStatus::Escalated | TicketStatus::Cancelled
        ) {
            return Err(StateError::NotEscalated {
                ticket_id: state.ticket().id().to_string(),
                status: state.status().to_string(),
            });
        }
        let ticket = state.ticket();
        let category = state.category();
        Ok(Self {
            ticket_id: ticket.id().to_string(),
            subject: ticket.subject().to_string(),
            description: ticket.description().to_string(),
            priority: ticket.priority(),
            customer_id: ticket.customer_id().map(str::to_string),
            category,
            confidence: state.confidence(),
            matched_signals: state
                .classification()
                .map(|c| c.matched_signals.clone())
                .unwrap_or_default(),
            assigned_team: profile(category).owning_team.to_string(),
            attempts: state.attempt_history().iter().map(AttemptRecord::from).collect(),
            status: state.status(),
            escalation_message: escalation_message(state, &reason),
            reason,
            degradations: state.degradations().to_vec(),
            timestamp: state.finished_at().unwrap_or_else(Utc::now),
        })
    }

    /// Feedback of every attempt, in order.
    pub fn all_feedback(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter_map(|a| a.feedback.as_deref())
            .collect()
    }
}

/// Human handoff text for an escalated ticket.
pub fn escalation_message(state: &TicketState, reason: &EscalationReason) -> String {
    let ticket = state.ticket();
    let category = state.category();
    let last = state.last_attempt();
    let draft = last
        .map(|a| a.draft_text.as_str())
        .unwrap_or("No draft generated");
    let feedback = last
        .and_then(|a| a.feedback.as_deref())
        .unwrap_or("No feedback available");

    format!(
        "Ticket {id} has been escalated to the {team} for human review ({reason}).\n\n\
Original Ticket:\n\
Subject: {subject}\n\
Description: {description}\n\
Category: {category} (confidence {confidence:.2})\n\n\
Attempts Made: {attempts}\n\
Last Draft: {draft}\n\
Last Reviewer Feedback: {feedback}\n\n\
Please review and respond manually.",
        id = ticket.id(),
        team = profile(category).owning_team,
        subject = ticket.subject(),
        description = ticket.description(),
        confidence = state.confidence(),
        attempts = state.attempts(),
    )
}
