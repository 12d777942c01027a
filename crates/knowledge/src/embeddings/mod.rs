//! Query embedding.
//!
//! The corpus was embedded offline; at answer time only the question needs a
//! vector, computed with the same provider and model the corpus used.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{MockProvider, OllamaProvider, OpenAIProvider};
