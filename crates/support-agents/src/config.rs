//! Runtime configuration — environment defaults with optional TOML overrides.
//!
//! `SupportConfig::default()` reads the environment. A TOML file passed with
//! `--config` overrides any subset of fields; anything it omits keeps the
//! environment default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use coordination::{ClassifierConfig, ExpansionSchedule, HeuristicThresholds, RetryPolicyConfig};
use serde::Deserialize;

/// Hosted OpenAI-compatible endpoint used when `SUPPORT_LLM_URL` is unset.
pub const DEFAULT_LLM_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_ESCALATION_LOG: &str = "escalation_log.jsonl";

/// Text-generation endpoint.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmEndpoint {
    /// Base URL, without the `/chat/completions` suffix
    pub url: String,
    pub model: String,
    /// Bearer token. `None` for local servers that need no auth.
    pub api_key: Option<String>,
}

impl Default for LlmEndpoint {
    fn default() -> Self {
        Self {
            url: std::env::var("SUPPORT_LLM_URL").unwrap_or_else(|_| DEFAULT_LLM_URL.into()),
            model: std::env::var("SUPPORT_LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            api_key: std::env::var("SUPPORT_LLM_API_KEY")
                .or_else(|_| std::env::var("GROQ_API_KEY"))
                .ok()
                .filter(|k| !k.trim().is_empty()),
        }
    }
}

impl std::fmt::Debug for LlmEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmEndpoint")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl LlmEndpoint {
    /// The hosted default cannot be called without a key; local servers can.
    pub fn is_usable(&self) -> bool {
        self.api_key.is_some() || self.url.trim_end_matches('/') != DEFAULT_LLM_URL
    }
}

/// Which routine evaluates drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind {
    /// Text-generation backend, fail-closed
    Llm,
    /// Deterministic rule pack
    Heuristic,
}

impl std::str::FromStr for EvaluatorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llm" => Ok(Self::Llm),
            "heuristic" => Ok(Self::Heuristic),
            other => anyhow::bail!("unknown evaluator '{other}' (expected llm or heuristic)"),
        }
    }
}

impl std::fmt::Display for EvaluatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Llm => write!(f, "llm"),
            Self::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// Sampling settings for one generation role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupportConfig {
    pub llm: LlmEndpoint,
    pub evaluator: EvaluatorKind,
    pub drafter_temperature: f32,
    pub drafter_max_tokens: u32,
    pub reviewer_temperature: f32,
    pub reviewer_max_tokens: u32,
    /// Upper bound on any single generation call.
    pub generation_timeout_secs: u64,
    /// Upper bound on any single corpus lookup.
    pub retrieval_timeout_secs: u64,
    /// JSONL file escalation records are appended to.
    pub escalation_log: PathBuf,
    /// JSON corpus to load instead of the built-in knowledge base.
    pub corpus_path: Option<PathBuf>,
    /// Tickets processed at once by `batch`.
    pub batch_concurrency: usize,
    pub classifier: ClassifierConfig,
    pub expansion: ExpansionSchedule,
    pub retry: RetryPolicyConfig,
    pub heuristics: HeuristicThresholds,
}

impl Default for SupportConfig {
    fn default() -> Self {
        let evaluator = std::env::var("SUPPORT_EVALUATOR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(EvaluatorKind::Llm);
        Self {
            llm: LlmEndpoint::default(),
            evaluator,
            drafter_temperature: 0.3,
            drafter_max_tokens: 500,
            reviewer_temperature: 0.1,
            reviewer_max_tokens: 300,
            generation_timeout_secs: 30,
            retrieval_timeout_secs: 5,
            escalation_log: std::env::var("SUPPORT_ESCALATION_LOG")
                .unwrap_or_else(|_| DEFAULT_ESCALATION_LOG.into())
                .into(),
            corpus_path: std::env::var("SUPPORT_CORPUS_PATH").ok().map(PathBuf::from),
            batch_concurrency: 4,
            classifier: ClassifierConfig::default(),
            expansion: ExpansionSchedule::default(),
            retry: RetryPolicyConfig::default(),
            heuristics: HeuristicThresholds::default(),
        }
    }
}

impl SupportConfig {
    /// Environment defaults, overridden by `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::from_toml_str(&text)
                    .with_context(|| format!("Invalid config file {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML configuration")
    }

    pub fn drafter_settings(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.drafter_temperature,
            max_tokens: self.drafter_max_tokens,
        }
    }

    pub fn reviewer_settings(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.reviewer_temperature,
            max_tokens: self.reviewer_max_tokens,
        }
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs.max(1))
    }

    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval_timeout_secs.max(1))
    }
}

/// Check if an inference endpoint is reachable (GET /models).
pub async fn check_endpoint(url: &str, api_key: Option<&str>) -> bool {
    let models_url = format!("{}/models", url.trim_end_matches('/'));
    let mut request = reqwest::Client::new()
        .get(&models_url)
        .timeout(Duration::from_secs(5));
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }
    match request.send().await {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}
