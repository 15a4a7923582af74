//! Escalation sinks — durable handoff of escalated tickets to humans.
//!
//! A sink accepts each `EscalationRecord` at most once per ticket id.
//! Sink failures never change a ticket's outcome; the orchestrator logs
//! them and reports `escalation_recorded = false`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use coordination::EscalationRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Receipt for a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkAck {
    pub ticket_id: String,
    /// Where the record landed (file path, `memory`, ...)
    pub location: String,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("escalation for ticket {0} is already recorded")]
    Duplicate(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize escalation record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Destination for escalation records.
#[async_trait]
pub trait EscalationSink: Send + Sync {
    async fn record(&self, record: &EscalationRecord) -> Result<SinkAck, SinkError>;
}

// ── JSONL file ──────────────────────────────────────────────────────────────

/// Append-only JSON-lines log, one record per line.
pub struct JsonlEscalationSink {
    path: PathBuf,
    /// Ticket ids already in the file; the lock also serialises appends
    recorded: tokio::sync::Mutex<HashSet<String>>,
}

#[derive(Deserialize)]
struct RecordId {
    ticket_id: String,
}

impl JsonlEscalationSink {
    /// Open (or lazily create) the log at `path`, loading the ids it holds.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        let mut recorded = HashSet::new();
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                for (lineno, line) in text.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<RecordId>(line) {
                        Ok(r) => {
                            recorded.insert(r.ticket_id);
                        }
                        Err(e) => warn!(
                            path = %path.display(),
                            line = lineno + 1,
                            error = %e,
                            "Skipping malformed escalation log line"
                        ),
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(SinkError::Io { path, source }),
        }
        info!(path = %path.display(), existing = recorded.len(), "Escalation log opened");
        Ok(Self {
            path,
            recorded: tokio::sync::Mutex::new(recorded),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of distinct tickets in the log.
    pub async fn len(&self) -> usize {
        self.recorded.lock().await.len()
    }

    pub async fn contains(&self, ticket_id: &str) -> bool {
        self.recorded.lock().await.contains(ticket_id)
    }
}

#[async_trait]
impl EscalationSink for JsonlEscalationSink {
    async fn record(&self, record: &EscalationRecord) -> Result<SinkAck, SinkError> {
        let mut recorded = self.recorded.lock().await;
        if recorded.contains(&record.ticket_id) {
            return Err(SinkError::Duplicate(record.ticket_id.clone()));
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let io_err = |source| SinkError::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        recorded.insert(record.ticket_id.clone());
        info!(
            ticket_id = %record.ticket_id,
            path = %self.path.display(),
            "Escalation recorded"
        );
        Ok(SinkAck {
            ticket_id: record.ticket_id.clone(),
            location: self.path.display().to_string(),
        })
    }
}

// ── In-memory ───────────────────────────────────────────────────────────────

/// In-process sink for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryEscalationSink {
    records: Mutex<Vec<EscalationRecord>>,
}

impl MemoryEscalationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EscalationRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl EscalationSink for MemoryEscalationSink {
    async fn record(&self, record: &EscalationRecord) -> Result<SinkAck, SinkError> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if records.iter().any(|r| r.ticket_id == record.ticket_id) {
            return Err(SinkError::Duplicate(record.ticket_id.clone()));
        }
        records.push(record.clone());
        Ok(SinkAck {
            ticket_id: record.ticket_id.clone(),
            location: "memory".to_string(),
        })
    }
}
