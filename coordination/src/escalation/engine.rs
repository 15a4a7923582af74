//! Retry Policy — deterministic resolve / retry / escalate decisions
//!
//! Consumes a `TicketState` after each recorded attempt and produces an
//! `AttemptDecision`. No I/O and no LLM calls in this module.

use serde::{Deserialize, Serialize};

use crate::escalation::state::{TicketState, MAX_ATTEMPTS};

/// Configuration for the retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicyConfig {
    /// Attempts before escalation
    pub max_attempts: u32,
    /// Expansion level of the first attempt
    pub base_expansion_level: u32,
}

impl Default for RetryPolicyConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_expansion_level: 1,
        }
    }
}

/// Why a ticket left the automated loop without a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    /// Every attempt was rejected
    RetryBudgetExhausted { attempts: u32 },
    /// The caller cancelled processing between attempts
    Cancelled { completed_attempts: u32 },
}

impl std::fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RetryBudgetExhausted { attempts } => {
                write!(f, "max attempts reached ({} rejected drafts)", attempts)
            }
            Self::Cancelled { completed_attempts } => {
                write!(f, "cancelled after {} attempts", completed_attempts)
            }
        }
    }
}

/// Decision produced after an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptDecision {
    /// Last draft approved
    Resolve,
    /// Run another attempt with more context and the last feedback
    Retry {
        next_attempt: u32,
        expansion_level: u32,
    },
    /// Budget spent; hand off to a human
    Escalate { reason: EscalationReason },
}

/// Pure decision function over ticket state.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryPolicyConfig,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RetryPolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryPolicyConfig {
        &self.config
    }

    /// Retry ceiling, never below one.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Expansion level for a 1-based attempt number: `base + n - 1`.
    pub fn expansion_level(&self, attempt_number: u32) -> u32 {
        self.config.base_expansion_level + attempt_number.max(1) - 1
    }

    /// Decide what follows the most recent attempt.
    pub fn decide(&self, state: &TicketState) -> AttemptDecision {
        let attempts = state.attempts();
        match state.last_attempt() {
            Some(last) if last.approved() => AttemptDecision::Resolve,
            Some(_) if attempts >= self.max_attempts().min(state.max_attempts()) => {
                AttemptDecision::Escalate {
                    reason: EscalationReason::RetryBudgetExhausted { attempts },
                }
            }
            _ => {
                let next_attempt = attempts + 1;
                AttemptDecision::Retry {
                    next_attempt,
                    expansion_level: self.expansion_level(next_attempt),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::state::tests::{attempt, classified_state};

    #[test]
    fn test_first_attempt_is_a_retry_at_base_level() {
        let state = classified_state();
        assert_eq!(
            RetryPolicy::new().decide(&state),
            AttemptDecision::Retry {
                next_attempt: 1,
                expansion_level: 1
            }
        );
    }

    #[test]
    fn test_approval_resolves() {
        let mut state = classified_state();
        state.record_attempt(attempt(1, true)).unwrap();
        assert_eq!(RetryPolicy::new().decide(&state), AttemptDecision::Resolve);
    }

    #[test]
    fn test_rejections_retry_then_escalate() {
        let policy = RetryPolicy::new();
        let mut state = classified_state();

        state.record_attempt(attempt(1, false)).unwrap();
        assert_eq!(
            policy.decide(&state),
            AttemptDecision::Retry {
                next_attempt: 2,
                expansion_level: 2
            }
        );
        state.record_attempt(attempt(2, false)).unwrap();
        assert_eq!(
            policy.decide(&state),
            AttemptDecision::Retry {
                next_attempt: 3,
                expansion_level: 3
            }
        );
        state.record_attempt(attempt(3, false)).unwrap();
        assert_eq!(
            policy.decide(&state),
            AttemptDecision::Escalate {
                reason: EscalationReason::RetryBudgetExhausted { attempts: 3 }
            }
        );
    }

    #[test]
    fn test_approval_on_last_attempt_still_resolves() {
        let mut state = classified_state();
        state.record_attempt(attempt(1, false)).unwrap();
        state.record_attempt(attempt(2, false)).unwrap();
        state.record_attempt(attempt(3, true)).unwrap();
        assert_eq!(RetryPolicy::new().decide(&state), AttemptDecision::Resolve);
    }

    #[test]
    fn test_expansion_level_is_monotonic() {
        let policy = RetryPolicy::with_config(RetryPolicyConfig {
            max_attempts: 5,
            base_expansion_level: 2,
        });
        let levels: Vec<u32> = (1..=5).map(|n| policy.expansion_level(n)).collect();
        assert_eq!(levels, vec![2, 3, 4, 5, 6]);
        assert_eq!(policy.expansion_level(0), 2);
    }

    #[test]
    fn test_escalation_reason_display() {
        assert_eq!(
            EscalationReason::RetryBudgetExhausted { attempts: 3 }.to_string(),
            "max attempts reached (3 rejected drafts)"
        );
    }
}
