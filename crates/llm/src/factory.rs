//! LLM provider factory.
//!
//! This module creates LLM clients from the provider name, endpoint,
//! credentials and request timeout resolved by the application config.

use crate::client::LlmClient;
use crate::providers::{MockLlmClient, OllamaClient, OpenAIClient};
use crate::types::ProviderType;
use docsbot_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama", "mock")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (for providers that require it)
/// * `timeout` - Per-request HTTP timeout
///
/// # Errors
/// Returns error if:
/// - Provider is unknown
/// - Required secrets are missing
/// - Client initialization fails
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            let client = OllamaClient::with_timeout(base_url, timeout)?;
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            let base_url = endpoint.unwrap_or("https://api.openai.com/v1");
            let client = OpenAIClient::with_base_url(api_key, base_url, Some(timeout))?;
            Ok(Arc::new(client))
        }
        ProviderType::Mock => Ok(Arc::new(MockLlmClient::new())),
    }
}
