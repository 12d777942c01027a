//! LLM provider implementations.

pub mod mock;
pub mod ollama;
pub mod openai;

pub use mock::MockLlmClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

use docsbot_core::AppError;

/// Map a failed HTTP status to an error, flagging retryable statuses.
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode, body: &str) -> AppError {
    let message = format!("{} API error ({}): {}", provider, status, body);
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        AppError::transient_llm(message)
    } else {
        AppError::llm(message)
    }
}

/// Map a transport-level reqwest failure to an error.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> AppError {
    let message = format!("Failed to send request to {}: {}", provider, err);
    if err.is_timeout() || err.is_connect() {
        AppError::transient_llm(message)
    } else {
        AppError::llm(message)
    }
}
