//! Batch telemetry — aggregate counts over processed tickets.
//!
//! Logged at the end of `batch` and `samples` runs, and printed as JSON with
//! `--json`.

use std::collections::BTreeMap;

use coordination::TicketStatus;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::orchestrator::{ProcessError, ProcessOutcome};

/// Aggregate view of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub resolved: usize,
    pub escalated: usize,
    pub cancelled: usize,
    /// Inputs rejected before processing started.
    pub rejected_inputs: usize,
    /// Escalations the sink did not accept.
    pub unrecorded_escalations: usize,
    pub total_attempts: u32,
    /// Tickets per category.
    pub by_category: BTreeMap<String, usize>,
    /// Tickets that saw each degradation at least once.
    pub degradations: BTreeMap<String, usize>,
    /// Sum of per-ticket processing time.
    pub processing_ms: u64,
}

impl BatchSummary {
    pub fn from_results(results: &[Result<ProcessOutcome, ProcessError>]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(_) => {
                    summary.rejected_inputs += 1;
                    continue;
                }
            };
            match outcome.status {
                TicketStatus::Resolved => summary.resolved += 1,
                TicketStatus::Escalated => summary.escalated += 1,
                TicketStatus::Cancelled => summary.cancelled += 1,
                TicketStatus::Processing => {}
            }
            if outcome.status != TicketStatus::Resolved && !outcome.escalation_recorded {
                summary.unrecorded_escalations += 1;
            }
            summary.total_attempts += outcome.attempts;
            summary.processing_ms += outcome.duration_ms;
            *summary
                .by_category
                .entry(outcome.category.to_string())
                .or_default() += 1;
            for kind in outcome.state.degradations() {
                *summary.degradations.entry(kind.to_string()).or_default() += 1;
            }
        }
        summary
    }

    /// Share of processed tickets that resolved without a human.
    pub fn resolution_rate(&self) -> f64 {
        let processed = self.total - self.rejected_inputs;
        if processed == 0 {
            0.0
        } else {
            self.resolved as f64 / processed as f64
        }
    }

    pub fn mean_attempts(&self) -> f64 {
        let processed = self.total - self.rejected_inputs;
        if processed == 0 {
            0.0
        } else {
            self.total_attempts as f64 / processed as f64
        }
    }

    pub fn log(&self) {
        info!(
            total = self.total,
            resolved = self.resolved,
            escalated = self.escalated,
            cancelled = self.cancelled,
            rejected_inputs = self.rejected_inputs,
            unrecorded_escalations = self.unrecorded_escalations,
            resolution_rate = self.resolution_rate(),
            mean_attempts = self.mean_attempts(),
            "Batch summary"
        );
    }
}
