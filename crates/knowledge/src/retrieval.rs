//! Retrieval engine: turns a question into a ranked set of chunks.

use crate::store::VectorStore;
use crate::types::{RetrievalQuery, RetrievedSet};
use docsbot_core::{AppError, AppResult};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Initial backoff before retrying a transient failure.
const INITIAL_BACKOFF_MS: u64 = 100;

/// Queries the vector store under the fixed answering policy.
#[derive(Clone)]
pub struct RetrievalEngine {
    store: Arc<dyn VectorStore>,
    timeout: Duration,
    retries: u32,
}

impl RetrievalEngine {
    /// `retries` is the number of extra attempts after a transient failure.
    pub fn new(store: Arc<dyn VectorStore>, timeout: Duration, retries: u32) -> Self {
        Self {
            store,
            timeout,
            retries,
        }
    }

    /// Retrieve chunks for `question` with [`RetrievalQuery::default_policy`].
    pub async fn retrieve(&self, question: &str) -> AppResult<RetrievedSet> {
        self.retrieve_with(&RetrievalQuery::default_policy(question))
            .await
    }

    /// Retrieve chunks for an explicit query.
    ///
    /// The result never exceeds `query.k` and never repeats content. Errors
    /// are reported as [`AppError::Retrieval`]; a partial set is never
    /// returned.
    #[instrument(skip(self, query), fields(store = self.store.name(), k = query.k))]
    pub async fn retrieve_with(&self, query: &RetrievalQuery) -> AppResult<RetrievedSet> {
        let mut attempt = 0;
        loop {
            match self.query_once(query).await {
                Ok(chunks) => {
                    let result = enforce_bounds(chunks, query.k);
                    debug!("Retrieved {} chunks", result.len());
                    return Ok(result);
                }
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                    warn!(
                        "Retrieval failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        self.retries + 1,
                        backoff_ms,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err(AppError::Retrieval(message)) => return Err(AppError::Retrieval(message)),
                Err(e) => return Err(AppError::Retrieval(e.to_string())),
            }
        }
    }

    async fn query_once(&self, query: &RetrievalQuery) -> AppResult<RetrievedSet> {
        tokio::time::timeout(self.timeout, self.store.query(query))
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "vector store did not answer within {:?}",
                    self.timeout
                ))
            })?
    }
}

/// Cap the result at `k` and drop repeated content, keeping the first copy.
fn enforce_bounds(chunks: RetrievedSet, k: usize) -> RetrievedSet {
    let mut seen = HashSet::new();
    chunks
        .into_iter()
        .filter(|chunk| seen.insert(chunk.content.clone()))
        .take(k)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentChunk;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Store that replays scripted results.
    struct ScriptedStore {
        script: Mutex<Vec<AppResult<Vec<DocumentChunk>>>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedStore {
        fn new(mut script: Vec<AppResult<Vec<DocumentChunk>>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl VectorStore for ScriptedStore {
        fn name(&self) -> &str {
            "scripted"
        }

        fn len(&self) -> usize {
            0
        }

        async fn query(&self, _query: &RetrievalQuery) -> AppResult<Vec<DocumentChunk>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn engine(store: Arc<ScriptedStore>, retries: u32) -> RetrievalEngine {
        RetrievalEngine::new(store, Duration::from_secs(5), retries)
    }

    #[tokio::test]
    async fn test_truncates_and_dedups() {
        let chunks = vec![
            DocumentChunk::new("a", "1.md"),
            DocumentChunk::new("a", "2.md"),
            DocumentChunk::new("b", "3.md"),
            DocumentChunk::new("c", "4.md"),
        ];
        let store = Arc::new(ScriptedStore::new(vec![Ok(chunks)]));
        let query = RetrievalQuery {
            k: 2,
            ..RetrievalQuery::default_policy("q")
        };

        let result = engine(store, 0).retrieve_with(&query).await.unwrap();
        let contents: Vec<&str> = result.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b"]);
        assert_eq!(result[0].source(), Some("1.md"));
    }

    #[tokio::test]
    async fn test_retries_transient_once() {
        let store = Arc::new(ScriptedStore::new(vec![
            Err(AppError::transient_embedding("connection reset")),
            Ok(vec![DocumentChunk::new("a", "1.md")]),
        ]));

        let result = engine(store.clone(), 1).retrieve("q").await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fatal_error_not_retried() {
        let store = Arc::new(ScriptedStore::new(vec![
            Err(AppError::Store("corrupt row".to_string())),
            Ok(vec![DocumentChunk::new("a", "1.md")]),
        ]));

        let err = engine(store.clone(), 1).retrieve("q").await.unwrap_err();
        assert!(matches!(err, AppError::Retrieval(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let store = Arc::new(ScriptedStore::new(vec![
            Err(AppError::transient_embedding("503")),
            Err(AppError::transient_embedding("503")),
            Ok(vec![DocumentChunk::new("a", "1.md")]),
        ]));

        let err = engine(store.clone(), 1).retrieve("q").await.unwrap_err();
        assert!(matches!(err, AppError::Retrieval(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_becomes_retrieval_error() {
        let mut store = ScriptedStore::new(vec![Ok(vec![DocumentChunk::new("a", "1.md")])]);
        store.delay = Some(Duration::from_millis(200));
        let engine = RetrievalEngine::new(Arc::new(store), Duration::from_millis(20), 0);

        let err = engine.retrieve("q").await.unwrap_err();
        assert!(matches!(err, AppError::Retrieval(_)));
        assert!(err.to_string().contains("did not answer"));
    }
}
