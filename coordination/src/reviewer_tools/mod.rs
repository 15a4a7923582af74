//! Reviewer analysis tools — deterministic evaluation routines.
//!
//! # Modules
//!
//! - [`rule_pack`]: five-criterion rule pack over draft text

pub mod rule_pack;

pub use rule_pack::{HeuristicEvaluator, HeuristicThresholds};
