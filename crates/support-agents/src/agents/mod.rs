//! Agents — the two backend-facing roles in an attempt.
//!
//! ```text
//!   RetrievalContext ──► Drafter ──► Degraded<String> ──► Evaluator ──► Degraded<ReviewVerdict>
//!          ▲                ▲                                 │
//!          │                └──── feedback (on retry) ◄───────┘
//!   Retriever::widen
//! ```
//!
//! Neither role ever returns an error. A failed or timed-out drafter call
//! serves the category fallback text; a failed LLM review fails closed
//! (rejected, unverified).

pub mod drafter;
pub mod reviewer;

pub use drafter::Drafter;
pub use reviewer::{evaluator_for, Evaluator, LlmEvaluator, RuleEvaluator};
