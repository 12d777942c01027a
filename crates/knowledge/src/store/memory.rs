//! In-memory vector store.

use super::{rank, VectorStore};
use crate::embeddings::EmbeddingProvider;
use crate::types::{DocumentChunk, RetrievalQuery, StoredChunk};
use async_trait::async_trait;
use docsbot_core::{AppError, AppResult};
use std::sync::Arc;

/// Corpus held entirely in memory; immutable once built.
#[derive(Debug)]
pub struct InMemoryStore {
    embedder: Arc<dyn EmbeddingProvider>,
    chunks: Vec<StoredChunk>,
}

impl InMemoryStore {
    /// Build a store from pre-embedded chunks.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, chunks: Vec<StoredChunk>) -> AppResult<Self> {
        for stored in &chunks {
            if stored.chunk.source().is_none() {
                return Err(AppError::Store(format!(
                    "Chunk without source metadata: {:.40}",
                    stored.chunk.content
                )));
            }
        }
        Ok(Self { embedder, chunks })
    }

    /// Embed `documents` with `embedder` and build a store from them.
    pub async fn from_documents(
        embedder: Arc<dyn EmbeddingProvider>,
        documents: Vec<DocumentChunk>,
    ) -> AppResult<Self> {
        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        let chunks = documents
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| StoredChunk::new(chunk, embedding))
            .collect();
        Self::new(embedder, chunks)
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }

    async fn query(&self, query: &RetrievalQuery) -> AppResult<Vec<DocumentChunk>> {
        let query_embedding = self.embedder.embed(&query.query_text).await?;
        Ok(rank(&self.chunks, &query_embedding, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockProvider;

    fn embedder() -> Arc<dyn EmbeddingProvider> {
        Arc::new(MockProvider::new(256))
    }

    #[tokio::test]
    async fn test_from_documents_and_query() {
        let store = InMemoryStore::from_documents(
            embedder(),
            vec![
                DocumentChunk::new("Install the CLI with cargo install", "install.md"),
                DocumentChunk::new("Invoices are emailed monthly", "billing.md"),
            ],
        )
        .await
        .unwrap();

        assert_eq!(store.len(), 2);
        let result = store
            .query(&RetrievalQuery::default_policy("how to install the CLI"))
            .await
            .unwrap();
        assert_eq!(result[0].source(), Some("install.md"));
    }

    #[test]
    fn test_rejects_chunk_without_source() {
        let chunk = DocumentChunk {
            content: "orphan".to_string(),
            metadata: Default::default(),
        };
        let result = InMemoryStore::new(embedder(), vec![StoredChunk::new(chunk, vec![1.0])]);
        assert!(matches!(result, Err(AppError::Store(_))));
    }

    #[tokio::test]
    async fn test_empty_store_returns_empty_set() {
        let store = InMemoryStore::new(embedder(), Vec::new()).unwrap();
        assert!(store.is_empty());
        let result = store
            .query(&RetrievalQuery::default_policy("anything"))
            .await
            .unwrap();
        assert!(result.is_empty());
    }
}
