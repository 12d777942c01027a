//! Read-only vector similarity stores.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::mmr::{maximal_marginal_relevance, MMR_LAMBDA};
use crate::types::{DocumentChunk, RetrievalQuery, StoredChunk};
use async_trait::async_trait;
use docsbot_core::AppResult;
use std::collections::HashSet;

/// A searchable corpus of embedded chunks.
///
/// Implementations embed `query.query_text` with the provider the corpus was
/// built with and return at most `query.k` chunks, most relevant first.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Number of chunks in the corpus.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn query(&self, query: &RetrievalQuery) -> AppResult<Vec<DocumentChunk>>;
}

/// Rank `corpus` against a query embedding.
///
/// Scores every chunk with the query metric and keeps the best `fetch_k`,
/// dropping repeated content. With `diversify` the pool is re-ranked by MMR,
/// otherwise it is cut to the top `k`.
pub(crate) fn rank(
    corpus: &[StoredChunk],
    query_embedding: &[f32],
    query: &RetrievalQuery,
) -> Vec<DocumentChunk> {
    let mut scored: Vec<(&StoredChunk, f32)> = corpus
        .iter()
        .map(|stored| {
            (
                stored,
                query.distance_metric.score(query_embedding, &stored.embedding),
            )
        })
        .filter(|(_, score)| score.is_finite())
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let pool_size = if query.diversify {
        query.fetch_k.max(query.k)
    } else {
        query.k
    };

    let mut seen = HashSet::new();
    let pool: Vec<&StoredChunk> = scored
        .into_iter()
        .map(|(stored, _)| stored)
        .filter(|stored| seen.insert(stored.chunk.content.as_str()))
        .take(pool_size)
        .collect();

    if !query.diversify {
        return pool.into_iter().map(|s| s.chunk.clone()).collect();
    }

    let embeddings: Vec<&[f32]> = pool.iter().map(|s| s.embedding.as_slice()).collect();
    maximal_marginal_relevance(query_embedding, &embeddings, query.k, MMR_LAMBDA)
        .into_iter()
        .map(|idx| pool[idx].chunk.clone())
        .collect()
}
