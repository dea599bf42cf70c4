//! Core data models used throughout Query Compass.
//!
//! These types represent the passages, corpus, and retrieval results that
//! flow through the classification and retrieval pipeline.

use serde::Serialize;

/// A unit of retrievable text with an identifier and metadata.
///
/// Passages are immutable once produced by ingestion. Keyword search
/// annotates a *clone* with a relevance score in its metadata; the corpus's
/// stored instances are never altered.
#[derive(Debug, Clone, Serialize)]
pub struct Passage {
    pub id: String,
    pub content: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Passage {
    /// Create a passage with empty metadata.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: serde_json::Map::new(),
        }
    }
}

/// The full set of ingested passages plus the concatenated source text.
///
/// Built once at startup and shared read-only for the lifetime of the
/// process (no mutation API is exposed after construction).
///
/// Invariant: `full_text` is non-empty if and only if `passages` is non-empty.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub passages: Vec<Passage>,
    pub full_text: String,
}

impl Corpus {
    /// An empty corpus, used when ingestion fails or is not configured.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

/// Which retrieval strategy produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strategy {
    Vector,
    Keyword,
    Heuristic,
    FullText,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Vector => "vector",
            Strategy::Keyword => "keyword",
            Strategy::Heuristic => "heuristic",
            Strategy::FullText => "fulltext",
        }
    }
}

/// The outcome of a retrieval cascade run. Produced fresh per query and
/// never cached.
///
/// `passages` is never empty: when every strategy comes back empty the
/// cascade falls back to the whole corpus text as a single passage.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub passages: Vec<Passage>,
    pub strategy: Strategy,
}

/// The coarse routing label assigned to a query.
///
/// Derived per query by the classifier; not persisted anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IntentCategory {
    Csv,
    Transport,
    Weather,
    Document,
}

impl IntentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::Csv => "csv",
            IntentCategory::Transport => "transport",
            IntentCategory::Weather => "weather",
            IntentCategory::Document => "document",
        }
    }
}
