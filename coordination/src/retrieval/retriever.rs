//! Retriever — category-scoped lookup with a progressive widening schedule
//!
//! Attempt `n+1` never sees less context than attempt `n`: the schedule is
//! non-decreasing and [`Retriever::widen`] unions the previous attempt's
//! documents with the fresh top-k.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CorpusError, ScheduleError};
use crate::retrieval::corpus::{CorpusLookup, Document};
use crate::ticket::Category;

/// How many documents one expansion level retrieves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StepRepr", into = "StepRepr")]
pub enum ExpansionStep {
    /// At most this many documents
    Top(usize),
    /// The whole category partition
    All,
}

impl ExpansionStep {
    /// Lookup limit; `None` means unbounded.
    pub fn limit(self) -> Option<usize> {
        match self {
            Self::Top(k) => Some(k),
            Self::All => None,
        }
    }

    fn covers(self, other: ExpansionStep) -> bool {
        match (self, other) {
            (Self::All, _) => true,
            (Self::Top(_), Self::All) => false,
            (Self::Top(a), Self::Top(b)) => a >= b,
        }
    }
}

impl std::fmt::Display for ExpansionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Top(k) => write!(f, "top-{}", k),
            Self::All => write!(f, "all"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StepRepr {
    Count(usize),
    Word(String),
}

impl TryFrom<StepRepr> for ExpansionStep {
    type Error = String;

    fn try_from(repr: StepRepr) -> Result<Self, Self::Error> {
        match repr {
            StepRepr::Count(k) => Ok(Self::Top(k)),
            StepRepr::Word(w) if w.eq_ignore_ascii_case("all") => Ok(Self::All),
            StepRepr::Word(w) => Err(format!("expected a count or \"all\", got \"{w}\"")),
        }
    }
}

impl From<ExpansionStep> for StepRepr {
    fn from(step: ExpansionStep) -> Self {
        match step {
            ExpansionStep::Top(k) => StepRepr::Count(k),
            ExpansionStep::All => StepRepr::Word("all".to_string()),
        }
    }
}

/// Non-decreasing step function `k(expansion_level)`.
///
/// Level 1 maps to the first step; levels past the end reuse the last step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ExpansionStep>", into = "Vec<ExpansionStep>")]
pub struct ExpansionSchedule {
    steps: Vec<ExpansionStep>,
}

impl ExpansionSchedule {
    pub fn new(steps: Vec<ExpansionStep>) -> Result<Self, ScheduleError> {
        if steps.is_empty() {
            return Err(ScheduleError::Empty);
        }
        for (index, step) in steps.iter().enumerate() {
            if *step == ExpansionStep::Top(0) {
                return Err(ScheduleError::ZeroStep { index });
            }
            if index > 0 && !step.covers(steps[index - 1]) {
                return Err(ScheduleError::Narrowing { index });
            }
        }
        Ok(Self { steps })
    }

    /// Step for a 1-based expansion level. Level 0 is treated as level 1.
    pub fn step(&self, level: u32) -> ExpansionStep {
        let idx = (level.max(1) as usize - 1).min(self.steps.len() - 1);
        self.steps[idx]
    }

    pub fn steps(&self) -> &[ExpansionStep] {
        &self.steps
    }
}

impl Default for ExpansionSchedule {
    fn default() -> Self {
        Self {
            steps: vec![
                ExpansionStep::Top(2),
                ExpansionStep::Top(3),
                ExpansionStep::All,
            ],
        }
    }
}

impl TryFrom<Vec<ExpansionStep>> for ExpansionSchedule {
    type Error = ScheduleError;

    fn try_from(steps: Vec<ExpansionStep>) -> Result<Self, Self::Error> {
        Self::new(steps)
    }
}

impl From<ExpansionSchedule> for Vec<ExpansionStep> {
    fn from(schedule: ExpansionSchedule) -> Self {
        schedule.steps
    }
}

/// Documents retrieved for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalContext {
    pub category: Category,
    /// Ordered by descending relevance, ties in corpus order
    pub documents: Vec<Document>,
    pub expansion_level: u32,
    pub query_terms: BTreeSet<String>,
    /// Snapshot version the documents came from
    pub corpus_version: String,
}

impl RetrievalContext {
    /// Context with no documents, used when the corpus is unavailable.
    pub fn empty(category: Category, query_terms: BTreeSet<String>, expansion_level: u32) -> Self {
        Self {
            category,
            documents: Vec::new(),
            expansion_level,
            query_terms,
            corpus_version: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn titles(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.title.clone()).collect()
    }

    pub fn document_ids(&self) -> HashSet<&str> {
        self.documents.iter().map(|d| d.id.as_str()).collect()
    }

    /// Every document of `other` is also present here.
    pub fn is_superset_of(&self, other: &RetrievalContext) -> bool {
        let ids = self.document_ids();
        other.documents.iter().all(|d| ids.contains(d.id.as_str()))
    }

    /// Render the documents as drafter prompt context.
    pub fn format_for_prompt(&self) -> String {
        if self.documents.is_empty() {
            return "No relevant documentation found.".to_string();
        }
        let mut out = String::from("Relevant Documentation:\n\n");
        for (i, doc) in self.documents.iter().enumerate() {
            out.push_str(&format!("{}. **{}**\n   {}\n\n", i + 1, doc.title, doc.body));
        }
        out
    }
}

/// Category-scoped retriever over a shared corpus.
#[derive(Clone)]
pub struct Retriever {
    corpus: Arc<dyn CorpusLookup>,
    schedule: ExpansionSchedule,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("corpus_version", &self.corpus.version())
            .field("schedule", &self.schedule)
            .finish()
    }
}

impl Retriever {
    pub fn new(corpus: Arc<dyn CorpusLookup>) -> Self {
        Self::with_schedule(corpus, ExpansionSchedule::default())
    }

    pub fn with_schedule(corpus: Arc<dyn CorpusLookup>, schedule: ExpansionSchedule) -> Self {
        Self { corpus, schedule }
    }

    pub fn schedule(&self) -> &ExpansionSchedule {
        &self.schedule
    }

    pub fn corpus_version(&self) -> &str {
        self.corpus.version()
    }

    /// Top-`k(expansion_level)` documents of `category` for `query_terms`.
    pub fn retrieve(
        &self,
        category: Category,
        query_terms: &BTreeSet<String>,
        expansion_level: u32,
    ) -> Result<RetrievalContext, CorpusError> {
        let step = self.schedule.step(expansion_level);
        let documents = self.corpus.lookup(category, query_terms, step.limit())?;
        debug!(
            category = %category,
            expansion_level,
            step = %step,
            returned = documents.len(),
            "Retrieved documents"
        );
        Ok(RetrievalContext {
            category,
            documents,
            expansion_level,
            query_terms: query_terms.clone(),
            corpus_version: self.corpus.version().to_string(),
        })
    }

    /// Retrieve for a follow-up attempt, keeping every document of `previous`.
    ///
    /// The result is re-scored against `query_terms` and ordered like a
    /// fresh lookup. Without a previous context this is [`Self::retrieve`].
    pub fn widen(
        &self,
        previous: Option<&RetrievalContext>,
        category: Category,
        query_terms: &BTreeSet<String>,
        expansion_level: u32,
    ) -> Result<RetrievalContext, CorpusError> {
        let previous = match previous {
            Some(p) if !p.documents.is_empty() => p,
            _ => return self.retrieve(category, query_terms, expansion_level),
        };

        let limit = self.schedule.step(expansion_level).limit();
        let ranked = self.corpus.lookup(category, query_terms, None)?;
        let keep = previous.document_ids();

        let mut documents: Vec<Document> = ranked
            .into_iter()
            .enumerate()
            .filter(|(rank, doc)| limit.map_or(true, |k| *rank < k) || keep.contains(doc.id.as_str()))
            .map(|(_, doc)| doc)
            .collect();

        // Documents no longer served by the corpus stay, with their old score.
        let present: HashSet<String> = documents.iter().map(|d| d.id.clone()).collect();
        documents.extend(
            previous
                .documents
                .iter()
                .filter(|d| !present.contains(&d.id))
                .cloned(),
        );

        debug!(
            category = %category,
            expansion_level,
            carried = previous.documents.len(),
            returned = documents.len(),
            "Widened retrieval"
        );
        Ok(RetrievalContext {
            category,
            documents,
            expansion_level,
            query_terms: query_terms.clone(),
            corpus_version: self.corpus.version().to_string(),
        })
    }
}
