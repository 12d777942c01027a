//! Error types for docsbot.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, language model, embedding, vector
//! store, retrieval, generation and prompt errors.

use thiserror::Error;

/// Unified error type for docsbot.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Library code returns these instead of panicking.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Language model provider errors
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        /// Whether a retry may succeed (timeouts, rate limits, 5xx)
        transient: bool,
    },

    /// Embedding provider errors
    #[error("Embedding error: {message}")]
    Embedding { message: String, transient: bool },

    /// Vector store errors (unreadable corpus, malformed rows)
    #[error("Vector store error: {0}")]
    Store(String),

    /// The retrieval stage failed; no partial result is returned
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// The generation stage failed after its retry budget
    #[error("Generation failed: {0}")]
    Generation(String),

    /// An outbound call exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Fatal language model error.
    pub fn llm(message: impl Into<String>) -> Self {
        AppError::Llm {
            message: message.into(),
            transient: false,
        }
    }

    /// Language model error worth one more attempt.
    pub fn transient_llm(message: impl Into<String>) -> Self {
        AppError::Llm {
            message: message.into(),
            transient: true,
        }
    }

    /// Fatal embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        AppError::Embedding {
            message: message.into(),
            transient: false,
        }
    }

    /// Embedding error worth one more attempt.
    pub fn transient_embedding(message: impl Into<String>) -> Self {
        AppError::Embedding {
            message: message.into(),
            transient: true,
        }
    }

    /// Whether retrying the failed call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Llm { transient, .. } | AppError::Embedding { transient, .. } => *transient,
            AppError::Timeout(_) => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
