//! Drafter — produces a candidate response for one attempt.

use std::sync::Arc;
use std::time::Duration;

use coordination::{profile, Category, Degraded, FailureKind, RetrievalContext, Ticket};
use tracing::{info, warn};

use crate::config::GenerationSettings;
use crate::llm::{GenerationError, GenerationRequest, TextGenerator};
use crate::prompts::{drafter_system_prompt, drafter_user_prompt};

/// Confidence reported for canned fallback text.
const FALLBACK_CONFIDENCE: f64 = 0.3;

pub struct Drafter {
    generator: Arc<dyn TextGenerator>,
    settings: GenerationSettings,
    timeout: Duration,
}

impl Drafter {
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

    /// Draft a response grounded in `context`, addressing `feedback` when
    /// this is a retry. Falls back to the category's canned response when
    /// generation fails or times out.
    pub async fn draft(
        &self,
        ticket: &Ticket,
        category: Category,
        context: &RetrievalContext,
        feedback: Option<&str>,
        attempt: u32,
    ) -> Degraded<String> {
        let request = GenerationRequest {
            system: drafter_system_prompt(category),
            user: drafter_user_prompt(ticket, context, feedback),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let result = match tokio::time::timeout(self.timeout, self.generator.generate(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.timeout)),
        };

        match result {
            Ok(text) => {
                info!(
                    ticket_id = %ticket.id(),
                    attempt,
                    backend = self.generator.name(),
                    chars = text.len(),
                    "Draft generated"
                );
                Degraded::full(text, self.generator.name())
            }
            Err(e) => {
                warn!(
                    ticket_id = %ticket.id(),
                    attempt,
                    category = %category,
                    error = %e,
                    "Draft generation failed, serving fallback response"
                );
                Degraded::fallback(
                    profile(category).fallback_response.to_string(),
                    format!("{category}_fallback"),
                    FALLBACK_CONFIDENCE,
                    FailureKind::GenerationUnavailable,
                    e.to_string(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::DisabledGenerator;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    struct RecordingGenerator {
        reply: &'static str,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.to_string())
        }
    }

    struct StalledGenerator;

    #[async_trait]
    impl TextGenerator for StalledGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".into())
        }
    }

    fn settings() -> GenerationSettings {
        GenerationSettings {
            temperature: 0.3,
            max_tokens: 500,
        }
    }

    fn ticket() -> Ticket {
        Ticket::new("Cannot login", "I keep getting an invalid password error").unwrap()
    }

    fn context() -> RetrievalContext {
        RetrievalContext::empty(Category::Technical, BTreeSet::new(), 1)
    }

    #[tokio::test]
    async fn test_successful_draft_is_full() {
        let generator = Arc::new(RecordingGenerator {
            reply: "Here are the steps.",
            seen: Mutex::new(Vec::new()),
        });
        let drafter = Drafter::new(generator.clone(), settings(), Duration::from_secs(5));
        let draft = drafter
            .draft(&ticket(), Category::Technical, &context(), Some("add steps"), 2)
            .await;
        assert!(draft.is_full());
        assert_eq!(draft.payload, "Here are the steps.");

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperature, 0.3);
        assert_eq!(seen[0].max_tokens, 500);
        assert!(seen[0].system.contains("TECHNICAL-SPECIFIC RULES"));
        assert!(seen[0].user.contains("add steps"));
    }

    #[tokio::test]
    async fn test_failure_serves_category_fallback() {
        let drafter = Drafter::new(
            Arc::new(DisabledGenerator::new("offline")),
            settings(),
            Duration::from_secs(5),
        );
        let draft = drafter
            .draft(&ticket(), Category::Security, &context(), None, 1)
            .await;
        assert!(draft.is_degraded());
        assert_eq!(draft.payload, profile(Category::Security).fallback_response);
        assert_eq!(draft.served_by, "security_fallback");
        assert_eq!(draft.failure, Some(FailureKind::GenerationUnavailable));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_serves_fallback() {
        let drafter = Drafter::new(Arc::new(StalledGenerator), settings(), Duration::from_secs(30));
        let draft = drafter
            .draft(&ticket(), Category::Technical, &context(), None, 1)
            .await;
        assert!(draft.is_degraded());
        assert!(draft.warnings[0].contains("timed out"));
    }
}
