//! Ticket Coordination Library
//!
//! Deterministic core of the support-ticket triage pipeline:
//! - Ticket model and per-category rule profiles
//! - Multi-signal classifier (keywords, patterns, heuristics)
//! - Versioned corpus snapshot and a retriever that widens per attempt
//! - Five-criterion review policy and a deterministic evaluator
//! - Ticket state machine, retry policy and escalation record
//!
//! Nothing in this crate performs network I/O or calls a language model.
//! The async shell that does lives in the `support-agents` crate.
//!
//! # Pipeline
//!
//! ```text
//! Ticket ─► TicketClassifier ─► Retriever ─► (drafter) ─► (reviewer) ─► RetryPolicy
//!                                   ▲                                     │
//!                                   └──── QueryTerms::augment(feedback) ◄─┘
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod errors;
pub mod escalation;
pub mod feedback;
pub mod profile;
pub mod resilience;
pub mod retrieval;
pub mod reviewer_policy;
pub mod reviewer_tools;
pub mod router;
pub mod ticket;

// Re-export ticket types
pub use ticket::{Category, Priority, Ticket, TicketId, TicketInput};

// Re-export error types
pub use errors::{CorpusError, FailureKind, ScheduleError, StateError, TicketError};

// Re-export profile types
pub use profile::{profile, CategoryProfile};

// Re-export classifier types
pub use router::{ClassificationResult, ClassifierConfig, TicketClassifier};

// Re-export retrieval types
pub use retrieval::{
    builtin_snapshot, CorpusLookup, CorpusSnapshot, Document, DocumentSource, ExpansionSchedule,
    ExpansionStep, RetrievalContext, Retriever,
};

// Re-export feedback types
pub use feedback::{feedback_terms, QueryTerms};

// Re-export review types
pub use reviewer_policy::{
    parse_review_output, CriterionVerdict, ReviewCriterion, ReviewVerdict, UNVERIFIED_FEEDBACK,
};
pub use reviewer_tools::{HeuristicEvaluator, HeuristicThresholds};

// Re-export escalation types
pub use escalation::{
    Attempt, AttemptDecision, AttemptRecord, EscalationReason, EscalationRecord, Phase,
    RetryPolicy, RetryPolicyConfig, ReviewOutcome, TicketState, TicketStatus, MAX_ATTEMPTS,
};

// Re-export resilience types
pub use resilience::{Degraded, DegradationLevel};
