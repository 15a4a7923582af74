//! Corpus Snapshot — immutable, versioned, category-partitioned documents
//!
//! A snapshot is built once, indexed once and then shared read-only
//! (`Arc<CorpusSnapshot>`) by every concurrent orchestration. Updating the
//! corpus means building a new snapshot, which gets a new version.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::CorpusError;
use crate::retrieval::terms::content_terms;
use crate::ticket::Category;

/// A scored document as returned by a lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier, unique within the snapshot
    pub id: String,
    /// Partition the document belongs to
    pub category: Category,
    pub title: String,
    pub body: String,
    /// Overlap with the query terms of the lookup that produced it
    pub relevance_score: f64,
}

/// Document definition as loaded from JSON or the built-in knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSource {
    #[serde(default)]
    pub id: Option<String>,
    pub category: Category,
    pub title: String,
    /// Accepts `content` as an alias
    #[serde(alias = "content")]
    pub body: String,
}

impl DocumentSource {
    pub fn new(category: Category, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: None,
            category,
            title: title.into(),
            body: body.into(),
        }
    }
}

/// The corpus lookup collaborator.
///
/// Implementations must be safe for concurrent reads and deterministic for a
/// fixed snapshot: identical arguments return identical ordered results.
pub trait CorpusLookup: Send + Sync {
    /// Return up to `limit` documents of `category` ordered by descending
    /// relevance to `query_terms`. `None` returns the whole partition.
    fn lookup(
        &self,
        category: Category,
        query_terms: &BTreeSet<String>,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, CorpusError>;

    /// Version identifier of the data being served.
    fn version(&self) -> &str;
}

#[derive(Debug, Clone)]
struct IndexedDocument {
    id: String,
    title: String,
    body: String,
    terms: BTreeSet<String>,
}

/// Read-only, versioned document snapshot.
#[derive(Debug, Clone)]
pub struct CorpusSnapshot {
    version: String,
    partitions: BTreeMap<Category, Vec<IndexedDocument>>,
}

impl CorpusSnapshot {
    /// Validate, index and fingerprint a set of documents.
    ///
    /// Insertion order within a category is preserved and used as the
    /// tie-break when scores are equal.
    pub fn new(sources: Vec<DocumentSource>) -> Result<Self, CorpusError> {
        let mut partitions: BTreeMap<Category, Vec<IndexedDocument>> = BTreeMap::new();
        let mut seen_ids = HashSet::new();
        let mut hasher = blake3::Hasher::new();

        for source in sources {
            let title = source.title.trim().to_string();
            let body = source.body.trim().to_string();
            if title.is_empty() || body.is_empty() {
                return Err(CorpusError::InvalidDocument(format!(
                    "{} document has an empty title or body",
                    source.category
                )));
            }

            let partition = partitions.entry(source.category).or_default();
            let id = match source.id.map(|id| id.trim().to_string()) {
                Some(id) if !id.is_empty() => id,
                _ => format!("{}-{:02}", source.category, partition.len() + 1),
            };
            if !seen_ids.insert(id.clone()) {
                return Err(CorpusError::InvalidDocument(format!("duplicate id {id}")));
            }

            for field in [source.category.as_str(), id.as_str(), title.as_str(), body.as_str()] {
                hasher.update(field.as_bytes());
                hasher.update(&[0]);
            }

            let terms = content_terms(&format!("{title} {body}"));
            partition.push(IndexedDocument {
                id,
                title,
                body,
                terms,
            });
        }

        let version = hasher.finalize().to_hex()[..16].to_string();
        Ok(Self {
            version,
            partitions,
        })
    }

    /// Parse a JSON array of `{category, title, body}` objects.
    pub fn from_json_str(json: &str) -> Result<Self, CorpusError> {
        let sources: Vec<DocumentSource> = serde_json::from_str(json)
            .map_err(|e| CorpusError::InvalidDocument(e.to_string()))?;
        Self::new(sources)
    }

    /// Load a snapshot from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, CorpusError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| CorpusError::Unavailable(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Number of documents in a category partition.
    pub fn partition_size(&self, category: Category) -> usize {
        self.partitions.get(&category).map_or(0, Vec::len)
    }

    /// Total documents across all partitions.
    pub fn len(&self) -> usize {
        self.partitions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Categories that have at least one document.
    pub fn categories(&self) -> Vec<Category> {
        self.partitions.keys().copied().collect()
    }
}

impl CorpusLookup for CorpusSnapshot {
    fn lookup(
        &self,
        category: Category,
        query_terms: &BTreeSet<String>,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, CorpusError> {
        let partition = self
            .partitions
            .get(&category)
            .ok_or(CorpusError::MissingPartition(category))?;

        let mut scored: Vec<Document> = partition
            .iter()
            .map(|doc| Document {
                id: doc.id.clone(),
                category,
                title: doc.title.clone(),
                body: doc.body.clone(),
                relevance_score: overlap_ratio(query_terms, &doc.terms),
            })
            .collect();

        // `sort_by` is stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        if let Some(limit) = limit {
            scored.truncate(limit);
        }
        Ok(scored)
    }

    fn version(&self) -> &str {
        &self.version
    }
}

/// `|query ∩ doc| / |query|`, 0.0 for an empty query.
pub fn overlap_ratio(query: &BTreeSet<String>, doc: &BTreeSet<String>) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let shared = query.intersection(doc).count();
    shared as f64 / query.len() as f64
}
