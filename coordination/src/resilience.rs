//! Resilience — degraded-mode results for backend calls
//!
//! Drafter and reviewer calls never fail outright. They return a
//! `Degraded<T>` that says whether the payload came from the backend or
//! from a deterministic fallback.
//!
//! ```text
//! backend call
//!   ├─ succeeds             → Degraded { level: Full, ... }
//!   ├─ fails, fallback used → Degraded { level: Partial, failure, warnings, ... }
//!   └─ nothing to serve     → Degraded { level: Unavailable, failure, ... }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::FailureKind;

/// How much of the backend's capability was available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationLevel {
    /// Backend succeeded.
    Full,
    /// Served by a fallback with lower fidelity.
    Partial,
    /// Nothing could be served; payload is a best-effort placeholder.
    Unavailable,
}

impl std::fmt::Display for DegradationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Partial => write!(f, "partial"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// A payload with degradation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Degraded<T> {
    pub payload: T,
    pub level: DegradationLevel,
    /// Trust in the payload (0.0–1.0)
    pub confidence: f64,
    /// Which backend or fallback produced the payload
    pub served_by: String,
    /// Failure class that forced the degradation
    pub failure: Option<FailureKind>,
    pub warnings: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> Degraded<T> {
    pub fn full(payload: T, served_by: impl Into<String>) -> Self {
        Self {
            payload,
            level: DegradationLevel::Full,
            confidence: 1.0,
            served_by: served_by.into(),
            failure: None,
            warnings: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Served by a fallback after `failure`.
    pub fn fallback(
        payload: T,
        served_by: impl Into<String>,
        confidence: f64,
        failure: FailureKind,
        warning: impl Into<String>,
    ) -> Self {
        Self {
            payload,
            level: DegradationLevel::Partial,
            confidence: confidence.clamp(0.0, 1.0),
            served_by: served_by.into(),
            failure: Some(failure),
            warnings: vec![warning.into()],
            timestamp: Utc::now(),
        }
    }

    pub fn unavailable(payload: T, failure: FailureKind, warning: impl Into<String>) -> Self {
        Self {
            payload,
            level: DegradationLevel::Unavailable,
            confidence: 0.0,
            served_by: "none".to_string(),
            failure: Some(failure),
            warnings: vec![warning.into()],
            timestamp: Utc::now(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.level == DegradationLevel::Full
    }

    pub fn is_degraded(&self) -> bool {
        self.level != DegradationLevel::Full
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Transform the payload, keeping the metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Degraded<U> {
        Degraded {
            payload: f(self.payload),
            level: self.level,
            confidence: self.confidence,
            served_by: self.served_by,
            failure: self.failure,
            warnings: self.warnings,
            timestamp: self.timestamp,
        }
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_is_not_degraded() {
        let r = Degraded::full("text", "llm");
        assert!(r.is_full());
        assert!(!r.is_degraded());
        assert_eq!(r.confidence, 1.0);
        assert!(r.failure.is_none());
    }

    #[test]
    fn test_fallback_clamps_confidence() {
        let r = Degraded::fallback(
            "canned",
            "billing_fallback",
            1.7,
            FailureKind::GenerationUnavailable,
            "timeout",
        );
        assert!(r.is_degraded());
        assert_eq!(r.level, DegradationLevel::Partial);
        assert_eq!(r.confidence, 1.0);
        assert_eq!(r.failure, Some(FailureKind::GenerationUnavailable));
    }

    #[test]
    fn test_map_keeps_metadata() {
        let r = Degraded::unavailable(3, FailureKind::ReviewUnavailable, "down")
            .with_warning("second")
            .map(|n| n * 2);
        assert_eq!(r.payload, 6);
        assert_eq!(r.level, DegradationLevel::Unavailable);
        assert_eq!(r.warnings, vec!["down", "second"]);
        assert_eq!(r.served_by, "none");
    }

    #[test]
    fn test_level_ordering() {
        assert!(DegradationLevel::Full < DegradationLevel::Partial);
        assert!(DegradationLevel::Partial < DegradationLevel::Unavailable);
    }
}
