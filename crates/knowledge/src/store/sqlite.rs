//! SQLite-backed corpus, opened read-only.
//!
//! Expected schema (written by the offline indexer):
//!
//! ```sql
//! CREATE TABLE chunks (
//!     id INTEGER PRIMARY KEY,
//!     content TEXT NOT NULL,
//!     metadata TEXT NOT NULL,   -- JSON object of strings, must contain "source"
//!     embedding BLOB NOT NULL   -- little-endian f32 values
//! );
//! ```
//!
//! All rows are loaded when the store is opened; queries never touch the
//! file again.

use super::{rank, VectorStore};
use crate::embeddings::EmbeddingProvider;
use crate::types::{DocumentChunk, RetrievalQuery, StoredChunk};
use async_trait::async_trait;
use docsbot_core::{AppError, AppResult};
use rusqlite::{Connection, OpenFlags};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read-only vector store over a SQLite corpus file.
#[derive(Debug)]
pub struct SqliteStore {
    path: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    chunks: Vec<StoredChunk>,
}

impl SqliteStore {
    /// Open `path` read-only and load every chunk.
    ///
    /// Fails if the file is missing, a row lacks `source` metadata, or an
    /// embedding does not match the embedder's dimensions.
    pub fn open(path: &Path, embedder: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::Store(format!(
                "Corpus not found at {:?}",
                path
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| AppError::Store(format!("Failed to open corpus {:?}: {}", path, e)))?;

        let chunks = load_chunks(&conn, embedder.dimensions())?;

        tracing::info!(
            path = %path.display(),
            chunks = chunks.len(),
            embedder = embedder.provider_name(),
            model = embedder.model_name(),
            "Loaded corpus"
        );

        Ok(Self {
            path: path.to_path_buf(),
            embedder,
            chunks,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_chunks(conn: &Connection, dimensions: usize) -> AppResult<Vec<StoredChunk>> {
    let mut stmt = conn
        .prepare("SELECT id, content, metadata, embedding FROM chunks ORDER BY id")
        .map_err(|e| AppError::Store(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })
        .map_err(|e| AppError::Store(format!("Failed to query chunks: {}", e)))?;

    let mut chunks = Vec::new();
    for row in rows {
        let (id, content, metadata_json, embedding_bytes) =
            row.map_err(|e| AppError::Store(format!("Failed to read chunk row: {}", e)))?;

        let metadata: BTreeMap<String, String> = serde_json::from_str(&metadata_json)
            .map_err(|e| AppError::Store(format!("Chunk {} has invalid metadata: {}", id, e)))?;

        let chunk = DocumentChunk { content, metadata };
        if chunk.source().is_none() {
            return Err(AppError::Store(format!(
                "Chunk {} has no source metadata",
                id
            )));
        }

        let embedding = bytes_to_embedding(&embedding_bytes)
            .ok_or_else(|| AppError::Store(format!("Chunk {} has a malformed embedding", id)))?;
        if embedding.len() != dimensions {
            return Err(AppError::Store(format!(
                "Chunk {} has {} dimensions, embedder produces {}",
                id,
                embedding.len(),
                dimensions
            )));
        }

        chunks.push(StoredChunk::new(chunk, embedding));
    }

    Ok(chunks)
}

/// Decode little-endian f32 values.
fn bytes_to_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }

    Some(
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    )
}

#[async_trait]
impl VectorStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }

    async fn query(&self, query: &RetrievalQuery) -> AppResult<Vec<DocumentChunk>> {
        let query_embedding = self.embedder.embed(&query.query_text).await?;
        let result = rank(&self.chunks, &query_embedding, query);

        tracing::debug!(
            "Retrieved {} chunks (k={}, fetch_k={}, diversify={})",
            result.len(),
            query.k,
            query.fetch_k,
            query.diversify
        );

        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::embeddings::MockProvider;
    use rusqlite::params;
    use tempfile::TempDir;

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// Write a corpus file the way the indexer lays it out.
    pub(crate) async fn write_corpus(
        path: &Path,
        embedder: &dyn EmbeddingProvider,
        rows: &[(&str, &str)],
    ) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE chunks (
                id INTEGER PRIMARY KEY,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL
            );",
        )
        .unwrap();

        for (content, source) in rows {
            let embedding = embedder.embed(content).await.unwrap();
            let metadata = serde_json::json!({ "source": source }).to_string();
            conn.execute(
                "INSERT INTO chunks (content, metadata, embedding) VALUES (?1, ?2, ?3)",
                params![content, metadata, embedding_to_bytes(&embedding)],
            )
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_open_and_query() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("corpus.db");
        let embedder = Arc::new(MockProvider::new(128));
        write_corpus(
            &path,
            embedder.as_ref(),
            &[
                ("Reset your password from the account page", "account.md"),
                ("Export reports as CSV from the dashboard", "reports.md"),
            ],
        )
        .await;

        let store = SqliteStore::open(&path, embedder).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.path(), path.as_path());

        let result = store
            .query(&RetrievalQuery::default_policy("how do I reset my password"))
            .await
            .unwrap();
        assert_eq!(result[0].source(), Some("account.md"));
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = SqliteStore::open(&temp.path().join("nope.db"), Arc::new(MockProvider::new(8)));
        assert!(matches!(result, Err(AppError::Store(_))));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("corpus.db");
        write_corpus(&path, &MockProvider::new(64), &[("text here", "a.md")]).await;

        let result = SqliteStore::open(&path, Arc::new(MockProvider::new(128)));
        assert!(result.unwrap_err().to_string().contains("dimensions"));
    }

    #[tokio::test]
    async fn test_row_without_source_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("corpus.db");
        let embedder = MockProvider::new(8);
        write_corpus(&path, &embedder, &[]).await;

        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO chunks (content, metadata, embedding) VALUES (?1, ?2, ?3)",
            params!["orphan", "{\"page\":\"1\"}", embedding_to_bytes(&[0.0; 8])],
        )
        .unwrap();
        drop(conn);

        let result = SqliteStore::open(&path, Arc::new(embedder));
        assert!(result.unwrap_err().to_string().contains("no source"));
    }

    #[test]
    fn test_bytes_to_embedding() {
        let bytes = embedding_to_bytes(&[1.0, -2.5]);
        assert_eq!(bytes_to_embedding(&bytes), Some(vec![1.0, -2.5]));
        assert_eq!(bytes_to_embedding(&[0, 1, 2]), None);
    }
}
