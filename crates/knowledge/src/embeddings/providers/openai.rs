//! OpenAI embedding provider using the `/embeddings` API.

use super::{check_dimensions, status_error, transport_error};
use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use docsbot_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Embedding provider backed by OpenAI or a compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAIProvider {
    pub fn new(
        api_key: &str,
        base_url: Option<&str>,
        model: &str,
        dimensions: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        if api_key.is_empty() {
            return Err(AppError::Config(
                "OpenAI API key must not be empty".to_string(),
            ));
        }

        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::embedding(format!("Failed to create HTTP client for OpenAI: {}", e))
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or(DEFAULT_OPENAI_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "openai",
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| transport_error("OpenAI", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(status_error("OpenAI", status, &detail));
        }

        let mut body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::embedding(format!("Failed to parse OpenAI response: {}", e))
        })?;

        if body.data.len() != texts.len() {
            return Err(AppError::embedding(format!(
                "OpenAI returned {} embeddings for {} inputs",
                body.data.len(),
                texts.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);
        body.data
            .into_iter()
            .map(|d| {
                check_dimensions("OpenAI", d.embedding.len(), self.dimensions)?;
                Ok(d.embedding)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_rejected() {
        assert!(OpenAIProvider::new(
            "",
            None,
            "text-embedding-ada-002",
            1536,
            Duration::from_secs(5)
        )
        .is_err());
    }

    #[test]
    fn test_custom_base_url() {
        let provider = OpenAIProvider::new(
            "sk-test",
            Some("http://localhost:8080/v1/"),
            "text-embedding-ada-002",
            1536,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
        assert_eq!(provider.provider_name(), "openai");
    }

    #[test]
    fn test_response_parsing_restores_order() {
        let json = r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#;
        let mut body: EmbeddingResponse = serde_json::from_str(json).unwrap();
        body.data.sort_by_key(|d| d.index);
        assert_eq!(body.data[0].embedding, vec![1.0, 0.0]);
    }

    #[test]
    fn test_error_body_parsing() {
        let json = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        let parsed: ErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.error.message, "Incorrect API key provided");
    }
}
