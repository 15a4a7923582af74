//! Failure taxonomy for ticket processing.
//!
//! Every backend failure class has an explicit kind. None of them is fatal:
//! they degrade into the normal retry/escalate flow. The only hard failure a
//! caller ever sees is a malformed ticket (`TicketError`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ticket::Category;

/// Degradation classes observed while processing a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Classifier confidence below threshold. Handled by the fallback category.
    ClassificationAmbiguous,
    /// Text-generation backend failed or timed out. Fallback text is used.
    GenerationUnavailable,
    /// Evaluation backend failed or timed out. The draft is rejected.
    ReviewUnavailable,
    /// All attempts were rejected. Triggers escalation.
    RetryBudgetExhausted,
    /// Retrieval backend failed or timed out. The attempt runs with no documents.
    CorpusUnavailable,
}

impl FailureKind {
    /// Whether this failure should abort processing. Always false.
    pub fn is_fatal(self) -> bool {
        false
    }

    /// What the orchestrator does when this failure occurs.
    pub fn suggested_action(self) -> &'static str {
        match self {
            Self::ClassificationAmbiguous => "continue with the fallback category",
            Self::GenerationUnavailable => "use the category fallback response",
            Self::ReviewUnavailable => "reject the draft and retry with more context",
            Self::RetryBudgetExhausted => "escalate to a human agent",
            Self::CorpusUnavailable => "draft with an empty context",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClassificationAmbiguous => write!(f, "classification_ambiguous"),
            Self::GenerationUnavailable => write!(f, "generation_unavailable"),
            Self::ReviewUnavailable => write!(f, "review_unavailable"),
            Self::RetryBudgetExhausted => write!(f, "retry_budget_exhausted"),
            Self::CorpusUnavailable => write!(f, "corpus_unavailable"),
        }
    }
}

/// Malformed ticket input. Rejected before the state machine starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at most {max} characters long (got {len})")]
    TooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },
}

/// Illegal transition on a `TicketState`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("ticket {ticket_id} is already {status}")]
    AlreadyTerminal { ticket_id: String, status: String },

    #[error("attempt budget of {max} exhausted for ticket {ticket_id}")]
    BudgetExhausted { ticket_id: String, max: u32 },

    #[error("expected attempt {expected}, got {got}")]
    OutOfSequence { expected: u32, got: u32 },

    #[error("ticket {ticket_id} has not been classified")]
    Unclassified { ticket_id: String },

    #[error("cannot move from phase {from} to {to}")]
    PhaseOrder { from: String, to: String },

    #[error("ticket {ticket_id} is {status}, not escalated or cancelled")]
    NotEscalated { ticket_id: String, status: String },
}

/// Failure of the corpus lookup collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorpusError {
    #[error("corpus unavailable: {0}")]
    Unavailable(String),

    #[error("no partition for category {0}")]
    MissingPartition(Category),

    #[error("invalid corpus document: {0}")]
    InvalidDocument(String),
}

/// Invalid expansion schedule configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("expansion schedule must have at least one step")]
    Empty,

    #[error("expansion schedule must be non-decreasing (step {index} narrows the context)")]
    Narrowing { index: usize },

    #[error("expansion step {index} retrieves zero documents")]
    ZeroStep { index: usize },
}
