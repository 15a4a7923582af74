//! Ticket Router Module
//!
//! Assigns each ticket one category from three merged signal sources:
//!
//! ```text
//! Source      | Weight                               | Example
//! ------------|--------------------------------------|--------------------------
//! Keywords    | primary 2.0 / secondary 1.0, scaled  | "refund", "login"
//! Patterns    | fixed bonus per match                | "charged twice"
//! Heuristics  | post-hoc nudges                      | "$29.99" -> billing
//! ```
//!
//! Ties are broken security > billing > technical > general.

pub mod classifier;
pub mod heuristics;

pub use classifier::{ClassificationResult, ClassifierConfig, TicketClassifier};
pub use heuristics::HeuristicHit;
