//! Similarity-search seam and in-memory index.
//!
//! The retrieval cascade only ever talks to the [`SimilaritySearch`] trait:
//! it supplies a search term, a top-K, and a minimum score, and consumes an
//! already-ranked passage sequence. Scoring, ranking, and the index itself
//! belong to the implementation.
//!
//! Two implementations ship here:
//! - **[`InMemoryIndex`]** — brute-force cosine similarity over embedded
//!   passages, built once at startup.
//! - **[`DisabledIndex`]** — always errors; the cascade tolerates this and
//!   falls through to keyword search, which keeps embedding-less
//!   configurations fully functional.

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::info;

use crate::config::EmbeddingConfig;
use crate::embedding::{
    cosine_similarity, create_provider, embed_query, embed_texts, EmbeddingProvider as _,
};
use crate::models::{Corpus, Passage};

/// External similarity-search capability consumed by the cascade.
///
/// May fail on transient errors (network, rate limits); callers must treat
/// a failure as an empty result, not a fatal condition.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    /// Return up to `top_k` passages scoring at least `min_score` against
    /// `query`, best first.
    async fn similarity_search(
        &self,
        query: &str,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<Passage>>;
}

/// Brute-force cosine index over the corpus passages.
///
/// Embeds every passage once at construction; each search embeds the query
/// and scans all stored vectors. Fine for a single-manual corpus.
pub struct InMemoryIndex {
    entries: Vec<(Passage, Vec<f32>)>,
    embedding: EmbeddingConfig,
}

impl InMemoryIndex {
    /// Embed the corpus and build the index.
    ///
    /// # Errors
    ///
    /// Fails if the embedding provider is disabled or the embedding call
    /// fails; startup wiring degrades to [`DisabledIndex`] in that case.
    pub async fn build(corpus: &Corpus, embedding: &EmbeddingConfig) -> Result<Self> {
        if !embedding.is_enabled() {
            bail!("cannot build similarity index: embedding provider is disabled");
        }
        let provider = create_provider(embedding)?;

        let texts: Vec<String> = corpus.passages.iter().map(|p| p.content.clone()).collect();
        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            embed_texts(embedding, &texts).await?
        };

        if vectors.len() != corpus.passages.len() {
            bail!(
                "embedding count mismatch: {} passages, {} vectors",
                corpus.passages.len(),
                vectors.len()
            );
        }

        info!(
            model = provider.model_name(),
            dims = provider.dims(),
            passages = vectors.len(),
            "similarity index built"
        );

        Ok(Self {
            entries: corpus.passages.iter().cloned().zip(vectors).collect(),
            embedding: embedding.clone(),
        })
    }
}

#[async_trait]
impl SimilaritySearch for InMemoryIndex {
    async fn similarity_search(
        &self,
        query: &str,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<Passage>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = embed_query(&self.embedding, query).await?;

        let mut scored: Vec<(f32, &Passage)> = self
            .entries
            .iter()
            .map(|(p, v)| (cosine_similarity(&query_vec, v), p))
            .filter(|(score, _)| *score >= min_score)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored.into_iter().map(|(_, p)| p.clone()).collect())
    }
}

/// A similarity index that always errors.
///
/// Used when no embedding provider is configured or index construction
/// failed. The cascade logs the error and proceeds to keyword search.
pub struct DisabledIndex;

#[async_trait]
impl SimilaritySearch for DisabledIndex {
    async fn similarity_search(
        &self,
        _query: &str,
        _top_k: usize,
        _min_score: f32,
    ) -> Result<Vec<Passage>> {
        bail!("similarity index is disabled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_index_errors() {
        let result = DisabledIndex.similarity_search("retard", 8, 0.15).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_build_rejects_disabled_embedding() {
        let corpus = Corpus::empty();
        let result = InMemoryIndex::build(&corpus, &EmbeddingConfig::default()).await;
        assert!(result.is_err());
    }
}
