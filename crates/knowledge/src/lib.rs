//! Retrieval-augmented answering over a read-only corpus.
//!
//! The crate covers everything between a cleaned-up question and a grounded
//! answer: query embedding, similarity search with MMR diversification,
//! context assembly, generation and source attribution.

pub mod attribution;
pub mod context;
pub mod embeddings;
pub mod mmr;
pub mod retrieval;
pub mod store;
pub mod synthesis;
pub mod types;


// Re-export commonly used types
pub use attribution::select_primary;
pub use context::{assemble, PromptContext, Turn};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use retrieval::RetrievalEngine;
pub use store::{InMemoryStore, SqliteStore, VectorStore};
pub use synthesis::{AnswerSynthesizer, SynthesisOptions, SynthesizedAnswer};
pub use types::{DistanceMetric, DocumentChunk, RetrievalQuery, RetrievedSet, StoredChunk};

use docsbot_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Open the configured corpus with its query embedder.
///
/// Loading reads the whole file, so it runs on the blocking pool.
pub async fn open_store(config: &AppConfig) -> AppResult<Arc<dyn VectorStore>> {
    let api_key = config.resolve_api_key("openai");
    let timeout = Duration::from_secs(config.bot.store_timeout_secs);
    let embedder = create_provider(&config.store, api_key.as_deref(), timeout)?;
    let path = config.dataset_path();

    tracing::debug!(
        "Opening corpus {:?} with {} embeddings ({})",
        path,
        embedder.provider_name(),
        embedder.model_name()
    );

    let store = tokio::task::spawn_blocking(move || SqliteStore::open(&path, embedder))
        .await
        .map_err(|e| AppError::Store(format!("Corpus loader task failed: {}", e)))??;

    Ok(Arc::new(store))
}
