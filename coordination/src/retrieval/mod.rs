//! Retrieval Module
//!
//! Scores documents of one category partition by term overlap with the
//! ticket query and returns a top-k that widens with each attempt.
//!
//! ```text
//! ticket text ─┐
//!              ├─► query terms ─► Retriever ─► CorpusLookup ─► RetrievalContext
//! feedback ────┘                     │
//!                          ExpansionSchedule (2 → 3 → all)
//! ```

pub mod corpus;
pub mod knowledge_base;
pub mod retriever;
pub mod terms;

pub use corpus::{CorpusLookup, CorpusSnapshot, Document, DocumentSource};
pub use knowledge_base::{builtin_documents, builtin_snapshot};
pub use retriever::{ExpansionSchedule, ExpansionStep, RetrievalContext, Retriever};
pub use terms::content_terms;
