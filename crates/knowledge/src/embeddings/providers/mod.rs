//! Embedding provider implementations.

pub mod mock;
pub mod ollama;
pub mod openai;

pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;

use docsbot_core::AppError;

/// Map a failed HTTP status to an error, flagging retryable statuses.
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode, detail: &str) -> AppError {
    let message = format!("{} embeddings API error ({}): {}", provider, status, detail);
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        AppError::transient_embedding(message)
    } else {
        AppError::embedding(message)
    }
}

/// Map a transport-level reqwest failure to an error.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> AppError {
    let message = format!("Failed to send embedding request to {}: {}", provider, err);
    if err.is_timeout() || err.is_connect() {
        AppError::transient_embedding(message)
    } else {
        AppError::embedding(message)
    }
}

/// Reject vectors that do not match the corpus dimension.
pub(crate) fn check_dimensions(provider: &str, got: usize, expected: usize) -> Result<(), AppError> {
    if got != expected {
        return Err(AppError::embedding(format!(
            "{} returned {} dimensions, expected {}",
            provider, got, expected
        )));
    }
    Ok(())
}
