//! Reviewer — judges a draft against the five review criteria.
//!
//! Two evaluators sit behind the `Evaluator` trait:
//!
//! | Evaluator       | Backend                | On failure                         |
//! |-----------------|------------------------|------------------------------------|
//! | `LlmEvaluator`  | `TextGenerator`        | fail closed: rejected, unverified  |
//! | `RuleEvaluator` | `HeuristicEvaluator`   | cannot fail                        |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use coordination::{
    parse_review_output, Category, Degraded, FailureKind, HeuristicEvaluator, RetrievalContext,
    ReviewVerdict, Ticket,
};
use tracing::{info, warn};

use crate::config::{EvaluatorKind, GenerationSettings, SupportConfig};
use crate::llm::{GenerationError, GenerationRequest, TextGenerator};
use crate::prompts::{reviewer_system_prompt, reviewer_user_prompt};

/// An evaluation routine for drafts. Never errors: an evaluator that cannot
/// reach its backend returns `ReviewVerdict::unavailable()`.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        ticket: &Ticket,
        category: Category,
        draft: &str,
        context: &RetrievalContext,
    ) -> Degraded<ReviewVerdict>;

    fn name(&self) -> &str;
}

// ── LLM evaluator ───────────────────────────────────────────────────────────

pub struct LlmEvaluator {
    generator: Arc<dyn TextGenerator>,
    settings: GenerationSettings,
    timeout: Duration,
}

impl LlmEvaluator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        settings: GenerationSettings,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            settings,
            timeout,
        }
    }
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    async fn evaluate(
        &self,
        ticket: &Ticket,
        category: Category,
        draft: &str,
        context: &RetrievalContext,
    ) -> Degraded<ReviewVerdict> {
        let request = GenerationRequest {
            system: reviewer_system_prompt(category),
            user: reviewer_user_prompt(ticket, category, draft, context),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let output = match tokio::time::timeout(self.timeout, self.generator.generate(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.timeout)),
        };

        let output = match output {
            Ok(text) => text,
            Err(e) => {
                warn!(ticket_id = %ticket.id(), error = %e, "Review unavailable, rejecting draft unverified");
                return Degraded::unavailable(
                    ReviewVerdict::unavailable(),
                    FailureKind::ReviewUnavailable,
                    e.to_string(),
                );
            }
        };

        match parse_review_output(&output) {
            Some(verdict) => {
                info!(
                    ticket_id = %ticket.id(),
                    approved = verdict.approved(),
                    failed = verdict.failed().len(),
                    "Review complete"
                );
                Degraded::full(verdict, self.generator.name())
            }
            None => {
                warn!(ticket_id = %ticket.id(), "Review output had no criterion lines, rejecting draft unverified");
                Degraded::unavailable(
                    ReviewVerdict::unavailable(),
                    FailureKind::ReviewUnavailable,
                    "unparseable review output",
                )
            }
        }
    }

    fn name(&self) -> &str {
        "llm"
    }
}

// ── Rule evaluator ──────────────────────────────────────────────────────────

/// Deterministic evaluator over `coordination::HeuristicEvaluator`.
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluator {
    rules: HeuristicEvaluator,
}

impl RuleEvaluator {
    pub fn new(rules: HeuristicEvaluator) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl Evaluator for RuleEvaluator {
    async fn evaluate(
        &self,
        ticket: &Ticket,
        category: Category,
        draft: &str,
        context: &RetrievalContext,
    ) -> Degraded<ReviewVerdict> {
        let verdict = self.rules.evaluate(ticket, category, draft, context);
        info!(
            ticket_id = %ticket.id(),
            approved = verdict.approved(),
            failed = verdict.failed().len(),
            "Heuristic review complete"
        );
        Degraded::full(verdict, "heuristic")
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

/// Evaluator selected by `config.evaluator`.
pub fn evaluator_for(
    config: &SupportConfig,
    generator: Arc<dyn TextGenerator>,
) -> Arc<dyn Evaluator> {
    match config.evaluator {
        EvaluatorKind::Llm => Arc::new(LlmEvaluator::new(
            generator,
            config.reviewer_settings(),
            config.generation_timeout(),
        )),
        EvaluatorKind::Heuristic => Arc::new(RuleEvaluator::new(HeuristicEvaluator::new(
            config.heuristics.clone(),
        ))),
    }
}
