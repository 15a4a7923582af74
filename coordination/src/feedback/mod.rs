//! Reviewer Feedback Module
//!
//! Carries reviewer feedback from one attempt into the next:
//!
//! ```text
//! Reviewer ─► feedback ─┬─► QueryTerms::augment ─► Retriever (attempt n+1)
//!                       └─► correction instructions ─► Drafter (attempt n+1)
//! ```

pub mod query;

pub use query::{feedback_terms, QueryTerms};
