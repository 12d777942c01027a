//! Deterministic mock LLM provider.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docsbot_core::{AppError, AppResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Mock provider for testing and offline runs.
///
/// Without a scripted reply it answers with a digest of the prompt, so
/// identical requests always yield identical text. Failures and latency can be
/// injected to exercise retry and timeout paths.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    reply: Option<String>,
    delay: Option<Duration>,
    failures: Mutex<Vec<AppError>>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockLlmClient {
    /// Create a mock that derives its reply from the prompt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Always reply with `reply`.
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = Some(reply.into());
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the next calls with these errors, in order.
    pub fn failing_with(self, errors: Vec<AppError>) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            *failures = errors.into_iter().rev().collect();
        }
        self
    }

    /// Number of `complete` calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt of the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }

    fn digest(prompt: &str) -> u64 {
        prompt
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
                (acc ^ b as u64).wrapping_mul(0x0100_0000_01b3)
            })
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(request.prompt.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted_failure = self.failures.lock().ok().and_then(|mut f| f.pop());
        if let Some(err) = scripted_failure {
            return Err(err);
        }

        let content = match self.reply {
            Some(ref reply) => reply.clone(),
            None => format!(
                "Mock answer {:016x} ({} prompt words)",
                Self::digest(&request.prompt),
                request.prompt.split_whitespace().count()
            ),
        };

        let prompt_tokens = request.prompt.split_whitespace().count() as u32;
        let completion_tokens = content.split_whitespace().count() as u32;

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::new(prompt_tokens, completion_tokens),
        })
    }
}
