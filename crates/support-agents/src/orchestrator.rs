//! Orchestrator — drives one ticket from intake to a terminal status.
//!
//! ```text
//! TicketInput ──validate──► Ticket ──classify (once)──► TicketState
//!                                                          │
//!        ┌─────────────────────────────────────────────────┘
//!        ▼
//!   RetryPolicy::decide ──Resolve──► resolved ──► final draft
//!        │      │
//!        │      └──Escalate──► escalated ──► EscalationRecord ──► sink
//!        ▼
//!      Retry{n, level}
//!        │  cancelled? ──► cancelled ──► partial record ──► sink
//!        ▼
//!   augment query with last feedback
//!   Retriever::widen (blocking pool, timeout)
//!   Drafter::draft   (timeout, fallback text)
//!   Evaluator::evaluate (timeout, fail closed)
//!   TicketState::record_attempt ──► back to decide
//! ```
//!
//! Each ticket owns its `TicketState`; concurrent tickets share only the
//! read-only corpus snapshot and the sink.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use coordination::{
    builtin_snapshot, Attempt, AttemptDecision, Category, CorpusLookup, CorpusSnapshot,
    EscalationReason, EscalationRecord, Phase, QueryTerms, RetrievalContext, Retriever,
    RetryPolicy, ReviewOutcome, StateError, Ticket, TicketClassifier, TicketError, TicketInput,
    TicketState, TicketStatus,
};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agents::{evaluator_for, Drafter, Evaluator};
use crate::config::SupportConfig;
use crate::llm::{generator_for, TextGenerator};
use crate::sink::{EscalationSink, JsonlEscalationSink};

/// Why `process` could not produce an outcome.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Malformed ticket input, rejected before processing starts.
    #[error("invalid ticket: {0}")]
    InvalidTicket(#[from] TicketError),

    /// Internal sequencing bug; the state machine refused a transition.
    #[error("state machine violation: {0}")]
    State(#[from] StateError),
}

/// Caller-facing result of processing one ticket.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub ticket_id: String,
    pub status: TicketStatus,
    pub category: Category,
    pub confidence: f64,
    pub attempts: u32,
    /// Approved draft when resolved, handoff text otherwise
    pub final_response_or_escalation_message: String,
    /// Whether the sink accepted the escalation record
    pub escalation_recorded: bool,
    pub duration_ms: u64,
    /// Full audit trail
    pub state: TicketState,
}

impl ProcessOutcome {
    pub fn is_resolved(&self) -> bool {
        self.status == TicketStatus::Resolved
    }
}

pub struct Orchestrator {
    classifier: TicketClassifier,
    retriever: Retriever,
    drafter: Drafter,
    evaluator: Arc<dyn Evaluator>,
    sink: Arc<dyn EscalationSink>,
    policy: RetryPolicy,
    retrieval_timeout: Duration,
}

impl Orchestrator {
    /// Wire every collaborator from configuration: corpus file (or the
    /// built-in knowledge base), generation client and JSONL sink.
    pub async fn from_config(config: &SupportConfig) -> Result<Self> {
        let corpus: Arc<dyn CorpusLookup> = match &config.corpus_path {
            Some(path) => Arc::new(
                CorpusSnapshot::from_json_file(path)
                    .with_context(|| format!("Failed to load corpus {}", path.display()))?,
            ),
            None => Arc::new(builtin_snapshot().context("Failed to build built-in knowledge base")?),
        };
        let sink = JsonlEscalationSink::open(&config.escalation_log)
            .await
            .with_context(|| {
                format!(
                    "Failed to open escalation log {}",
                    config.escalation_log.display()
                )
            })?;
        info!(
            corpus_version = corpus.version(),
            model = %config.llm.model,
            evaluator = %config.evaluator,
            escalation_log = %config.escalation_log.display(),
            "Orchestrator configured"
        );
        Ok(Self::from_parts(
            config,
            generator_for(&config.llm),
            corpus,
            Arc::new(sink),
        ))
    }

    /// Wire from configuration with injected collaborators.
    pub fn from_parts(
        config: &SupportConfig,
        generator: Arc<dyn TextGenerator>,
        corpus: Arc<dyn CorpusLookup>,
        sink: Arc<dyn EscalationSink>,
    ) -> Self {
        Self {
            classifier: TicketClassifier::with_config(config.classifier.clone()),
            retriever: Retriever::with_schedule(corpus, config.expansion.clone()),
            drafter: Drafter::new(
                generator.clone(),
                config.drafter_settings(),
                config.generation_timeout(),
            ),
            evaluator: evaluator_for(config, generator),
            sink,
            policy: RetryPolicy::with_config(config.retry.clone()),
            retrieval_timeout: config.retrieval_timeout(),
        }
    }

    /// Replace the configured evaluator.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.retrieval_timeout = timeout;
        self
    }

    pub fn corpus_version(&self) -> &str {
        self.retriever.corpus_version()
    }

    /// Process one ticket to a terminal status.
    pub async fn process(&self, input: TicketInput) -> Result<ProcessOutcome, ProcessError> {
        self.process_with_cancellation(input, &CancellationToken::new())
            .await
    }

    /// Process one ticket, stopping between attempts once `cancel` fires.
    pub async fn process_with_cancellation(
        &self,
        input: TicketInput,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutcome, ProcessError> {
        let ticket = Ticket::try_from(input)?;
        self.process_ticket(ticket, cancel).await
    }

    /// Process independent tickets with at most `concurrency` in flight.
    /// Results come back in input order.
    pub async fn process_batch(
        &self,
        inputs: Vec<TicketInput>,
        concurrency: usize,
    ) -> Vec<Result<ProcessOutcome, ProcessError>> {
        let cancel = CancellationToken::new();
        stream::iter(inputs)
            .map(|input| {
                let cancel = &cancel;
                async move { self.process_with_cancellation(input, cancel).await }
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    /// Run the attempt loop for an already validated ticket.
    pub async fn process_ticket(
        &self,
        ticket: Ticket,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutcome, ProcessError> {
        ticket.validate()?;
        let started = Instant::now();
        let ticket_id = ticket.id().to_string();

        for advisory in ticket.advisories() {
            warn!(ticket_id = %ticket_id, advisory = %advisory, "Ticket advisory");
        }

        let mut state = TicketState::new(ticket, self.policy.max_attempts());

        let classification = self
            .classifier
            .classify(state.ticket().subject(), state.ticket().description());
        info!(
            ticket_id = %ticket_id,
            category = %classification.category,
            confidence = classification.confidence,
            ambiguous = classification.is_ambiguous(),
            "Ticket classified"
        );
        debug!(ticket_id = %ticket_id, summary = %classification.summary(), "Classification detail");
        state.record_classification(classification)?;

        let mut query = QueryTerms::from_ticket_text(&state.ticket().full_text());

        let escalation = loop {
            match self.policy.decide(&state) {
                AttemptDecision::Resolve => {
                    state.resolve()?;
                    break None;
                }
                AttemptDecision::Escalate { reason } => {
                    state.escalate()?;
                    break Some(reason);
                }
                AttemptDecision::Retry {
                    next_attempt,
                    expansion_level,
                } => {
                    if cancel.is_cancelled() {
                        info!(
                            ticket_id = %ticket_id,
                            completed_attempts = state.attempts(),
                            "Processing cancelled"
                        );
                        state.cancel()?;
                        break Some(EscalationReason::Cancelled {
                            completed_attempts: state.attempts(),
                        });
                    }
                    if let Some(feedback) = state.last_feedback() {
                        let added = query.augment(feedback);
                        debug!(ticket_id = %ticket_id, added, total = query.len(), "Query augmented from feedback");
                    }
                    let attempt = self
                        .run_attempt(&mut state, &query, next_attempt, expansion_level)
                        .await?;
                    info!(
                        ticket_id = %ticket_id,
                        attempt = next_attempt,
                        expansion_level,
                        documents = attempt.context_used.documents.len(),
                        outcome = %attempt.review_outcome,
                        duration_ms = attempt.duration_ms(),
                        "Attempt complete"
                    );
                    state.record_attempt(attempt)?;
                }
            }
        };

        let (message, escalation_recorded) = match escalation {
            None => {
                let response = state
                    .last_attempt()
                    .map(|a| a.draft_text.clone())
                    .unwrap_or_default();
                (response, false)
            }
            Some(reason) => {
                let record = EscalationRecord::from_state(&state, reason)?;
                let recorded = match self.sink.record(&record).await {
                    Ok(ack) => {
                        debug!(ticket_id = %ack.ticket_id, location = %ack.location, "Sink acknowledged");
                        true
                    }
                    Err(e) => {
                        warn!(ticket_id = %ticket_id, error = %e, "Escalation sink failed");
                        false
                    }
                };
                (record.escalation_message, recorded)
            }
        };

        let outcome = ProcessOutcome {
            ticket_id,
            status: state.status(),
            category: state.category(),
            confidence: state.confidence(),
            attempts: state.attempts(),
            final_response_or_escalation_message: message,
            escalation_recorded,
            duration_ms: started.elapsed().as_millis() as u64,
            state,
        };
        info!(
            ticket_id = %outcome.ticket_id,
            status = %outcome.status,
            category = %outcome.category,
            attempts = outcome.attempts,
            duration_ms = outcome.duration_ms,
            "Ticket finished"
        );
        Ok(outcome)
    }

    /// One retrieve → draft → review pass.
    async fn run_attempt(
        &self,
        state: &mut TicketState,
        query: &QueryTerms,
        attempt_number: u32,
        expansion_level: u32,
    ) -> Result<Attempt, StateError> {
        let started_at = Utc::now();
        let category = state.category();

        state.enter_phase(Phase::Retrieving)?;
        let (context, corpus_degraded) = match self
            .retrieve(state, category, query.terms(), expansion_level)
            .await
        {
            Ok(context) => (context, false),
            Err(reason) => {
                warn!(
                    ticket_id = %state.ticket().id(),
                    attempt = attempt_number,
                    error = %reason,
                    "Corpus unavailable, drafting with empty context"
                );
                (
                    RetrievalContext::empty(category, query.terms().clone(), expansion_level),
                    true,
                )
            }
        };

        state.enter_phase(Phase::Drafting)?;
        let draft = self
            .drafter
            .draft(
                state.ticket(),
                category,
                &context,
                state.last_feedback(),
                attempt_number,
            )
            .await;

        state.enter_phase(Phase::Reviewing)?;
        let review = self
            .evaluator
            .evaluate(state.ticket(), category, &draft.payload, &context)
            .await;

        let draft_degraded = draft.is_degraded();
        let review_degraded = review.is_degraded();
        let verdict = review.into_payload();
        let review_outcome = if verdict.approved() {
            ReviewOutcome::Approved
        } else {
            ReviewOutcome::Rejected
        };

        Ok(Attempt {
            attempt_number,
            context_used: context,
            draft_text: draft.into_payload(),
            review_outcome,
            feedback: verdict.feedback(),
            criteria: verdict.criteria,
            draft_degraded,
            review_degraded,
            corpus_degraded,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Widen from the last successful retrieval on the blocking pool,
    /// bounded by the retrieval timeout.
    async fn retrieve(
        &self,
        state: &TicketState,
        category: Category,
        terms: &BTreeSet<String>,
        expansion_level: u32,
    ) -> std::result::Result<RetrievalContext, String> {
        let previous = state
            .attempt_history()
            .iter()
            .rev()
            .find(|a| !a.corpus_degraded)
            .map(|a| a.context_used.clone());
        let retriever = self.retriever.clone();
        let terms = terms.clone();
        let task = tokio::task::spawn_blocking(move || {
            retriever.widen(previous.as_ref(), category, &terms, expansion_level)
        });

        match tokio::time::timeout(self.retrieval_timeout, task).await {
            Ok(Ok(Ok(context))) => Ok(context),
            Ok(Ok(Err(e))) => Err(e.to_string()),
            Ok(Err(e)) => Err(format!("retrieval task failed: {e}")),
            Err(_) => Err(format!(
                "retrieval timed out after {:?}",
                self.retrieval_timeout
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluatorKind;
    use crate::llm::DisabledGenerator;
    use crate::sink::MemoryEscalationSink;
    use coordination::{CorpusError, Document, FailureKind};

    struct BrokenCorpus;

    impl CorpusLookup for BrokenCorpus {
        fn lookup(
            &self,
            _category: Category,
            _query_terms: &BTreeSet<String>,
            _limit: Option<usize>,
        ) -> std::result::Result<Vec<Document>, CorpusError> {
            Err(CorpusError::Unavailable("disk gone".into()))
        }

        fn version(&self) -> &str {
            "broken"
        }
    }

    /// Answers correctly, but only after the retrieval timeout has passed.
    struct SlowCorpus {
        inner: CorpusSnapshot,
        delay: Duration,
    }

    impl CorpusLookup for SlowCorpus {
        fn lookup(
            &self,
            category: Category,
            query_terms: &BTreeSet<String>,
            limit: Option<usize>,
        ) -> std::result::Result<Vec<Document>, CorpusError> {
            std::thread::sleep(self.delay);
            self.inner.lookup(category, query_terms, limit)
        }

        fn version(&self) -> &str {
            "slow"
        }
    }

    fn offline(corpus: Arc<dyn CorpusLookup>) -> (Orchestrator, Arc<MemoryEscalationSink>) {
        let mut config = SupportConfig::default();
        config.evaluator = EvaluatorKind::Heuristic;
        let sink = Arc::new(MemoryEscalationSink::new());
        let orchestrator = Orchestrator::from_parts(
            &config,
            Arc::new(DisabledGenerator::new("offline")),
            corpus,
            sink.clone(),
        );
        (orchestrator, sink)
    }

    fn login_ticket() -> TicketInput {
        TicketInput::new(
            "Cannot login to my account",
            "I keep getting invalid credentials error even though my password is correct",
        )
    }

    #[tokio::test]
    async fn test_blank_ticket_is_rejected() {
        let (orchestrator, sink) = offline(Arc::new(builtin_snapshot().unwrap()));
        let err = orchestrator
            .process(TicketInput::new("   ", "I keep getting an error"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::InvalidTicket(_)));
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn test_offline_backend_escalates_after_budget() {
        let (orchestrator, sink) = offline(Arc::new(builtin_snapshot().unwrap()));
        let outcome = orchestrator.process(login_ticket()).await.unwrap();

        assert_eq!(outcome.status, TicketStatus::Escalated);
        assert_eq!(outcome.category, Category::Technical);
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.escalation_recorded);
        assert!(outcome
            .final_response_or_escalation_message
            .contains("Attempts Made: 3"));

        let history = outcome.state.attempt_history();
        assert!(history.iter().all(|a| a.draft_degraded));
        for pair in history.windows(2) {
            assert!(pair[1].context_used.expansion_level >= pair[0].context_used.expansion_level);
            assert!(pair[1].context_used.is_superset_of(&pair[0].context_used));
        }
        assert!(outcome
            .state
            .degradations()
            .contains(&FailureKind::GenerationUnavailable));

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].attempts.len(), 3);
        assert_eq!(records[0].all_feedback().len(), 3);
    }

    #[tokio::test]
    async fn test_broken_corpus_degrades_to_empty_context() {
        let (orchestrator, _sink) = offline(Arc::new(BrokenCorpus));
        let outcome = orchestrator.process(login_ticket()).await.unwrap();
        assert_eq!(outcome.status, TicketStatus::Escalated);
        assert!(outcome
            .state
            .attempt_history()
            .iter()
            .all(|a| a.corpus_degraded && a.context_used.is_empty()));
        assert!(outcome
            .state
            .degradations()
            .contains(&FailureKind::CorpusUnavailable));
    }

    #[tokio::test]
    async fn test_slow_corpus_times_out_to_empty_context() {
        let corpus = SlowCorpus {
            inner: builtin_snapshot().unwrap(),
            delay: Duration::from_millis(400),
        };
        let (orchestrator, sink) = offline(Arc::new(corpus));
        let orchestrator = orchestrator.with_retrieval_timeout(Duration::from_millis(20));
        assert_eq!(orchestrator.corpus_version(), "slow");

        let outcome = orchestrator.process(login_ticket()).await.unwrap();
        assert_eq!(outcome.status, TicketStatus::Escalated);
        assert_eq!(outcome.attempts, 3);
        assert!(outcome
            .state
            .attempt_history()
            .iter()
            .all(|a| a.corpus_degraded && a.context_used.is_empty()));
        assert!(outcome
            .state
            .degradations()
            .contains(&FailureKind::CorpusUnavailable));
        assert_eq!(sink.records().len(), 1);
    }

    #[tokio::test]
    async fn test_short_ticket_reaches_terminal_status() {
        let (orchestrator, sink) = offline(Arc::new(builtin_snapshot().unwrap()));
        let outcome = orchestrator
            .process(TicketInput::new("Help", "Hacked!"))
            .await
            .unwrap();
        assert!(outcome.status.is_terminal());
        assert_eq!(outcome.status, TicketStatus::Escalated);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(sink.records().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let (orchestrator, sink) = offline(Arc::new(builtin_snapshot().unwrap()));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = orchestrator
            .process_with_cancellation(login_ticket(), &cancel)
            .await
            .unwrap();
        assert_eq!(outcome.status, TicketStatus::Cancelled);
        assert_eq!(outcome.attempts, 0);
        assert_eq!(sink.records()[0].status, TicketStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let (orchestrator, _sink) = offline(Arc::new(builtin_snapshot().unwrap()));
        let inputs = vec![
            TicketInput::new("Double charged this month", "I was charged $29.99 twice for my subscription"),
            TicketInput::new("  ", "subject left blank"),
            TicketInput::new("Suspicious login activity", "Someone logged into my account from another country, I think I was hacked"),
        ];
        let results = orchestrator.process_batch(inputs, 2).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().category, Category::Billing);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().category, Category::Security);
    }
}
