//! Embedding provider trait and factory.

use docsbot_core::config::StoreConfig;
use docsbot_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

use super::providers::{MockProvider, OllamaProvider, OpenAIProvider};

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::embedding("No embedding returned"))
    }
}

/// Create the query embedder described by the store configuration.
///
/// `api_key` is only consulted by the OpenAI provider.
pub fn create_provider(
    config: &StoreConfig,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.embedding_provider.as_str() {
        "mock" => Ok(Arc::new(
            MockProvider::new(config.dimensions).with_model(&config.embedding_model),
        )),

        "ollama" => {
            let provider = OllamaProvider::new(
                config.embedding_endpoint.as_deref(),
                &config.embedding_model,
                config.dimensions,
                timeout,
            )?;
            Ok(Arc::new(provider))
        }

        "openai" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI embeddings require an API key".to_string())
            })?;
            let provider = OpenAIProvider::new(
                api_key,
                config.embedding_endpoint.as_deref(),
                &config.embedding_model,
                config.dimensions,
                timeout,
            )?;
            Ok(Arc::new(provider))
        }

        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: mock, ollama, openai",
            other
        ))),
    }
}
