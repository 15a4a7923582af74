//! Escalation — Ticket State Machine and Retry Policy
//!
//! Pure state machine with no I/O. The orchestrator drives it; every
//! decision here is deterministic.
//!
//! # Lifecycle
//!
//! ```text
//! processing ── classifying
//!     │
//!     ├─► retrieving ─► drafting ─► reviewing ─► record attempt n
//!     │        ▲                                      │
//!     │        └──── rejected, n < MAX_ATTEMPTS ──────┤
//!     │                                               │
//!     ├─ approved ───────────────────────────────► resolved
//!     ├─ rejected, n == MAX_ATTEMPTS ────────────► escalated ─► EscalationRecord
//!     └─ cancelled between attempts ─────────────► cancelled ─► EscalationRecord
//! ```

pub mod engine;
pub mod record;
pub mod state;

pub use engine::{AttemptDecision, EscalationReason, RetryPolicy, RetryPolicyConfig};
pub use record::{escalation_message, AttemptRecord, EscalationRecord};
pub use state::{Attempt, Phase, ReviewOutcome, TicketState, TicketStatus, MAX_ATTEMPTS};
