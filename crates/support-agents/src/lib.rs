//! Support Agents — async shell around the `coordination` core.
//!
//! Owns everything that touches the outside world: the text-generation
//! client, the drafter and reviewer agents, escalation sinks, configuration
//! and the orchestrator that sequences them per ticket.

#![allow(clippy::uninlined_format_args)]

pub mod agents;
pub mod config;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod samples;
pub mod sink;
pub mod telemetry;

pub use config::SupportConfig;
pub use orchestrator::{Orchestrator, ProcessError, ProcessOutcome};
