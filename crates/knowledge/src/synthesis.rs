//! Answer synthesis: one bounded, deterministic model call per question.

use crate::context::{PromptContext, Turn};
use crate::types::RetrievedSet;
use docsbot_core::{AppError, AppResult};
use docsbot_llm::{LlmClient, LlmRequest};
use docsbot_prompt::{build_prompt, BuiltPrompt, PromptDefinition};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

/// Answers are reproducible for a given context.
pub const ANSWER_TEMPERATURE: f32 = 0.0;

const INITIAL_BACKOFF_MS: u64 = 200;

/// Model output plus the chunks it was grounded on.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAnswer {
    pub text: String,
    /// Same chunks, same order as retrieved
    pub documents: RetrievedSet,
}

/// Generation settings shared by every call.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub model: String,
    pub timeout: Duration,
    /// Extra attempts after a transient failure (0 or 1)
    pub retries: u32,
}

/// Calls the language model with rendered prompts.
///
/// All calls go through one semaphore so the number of outstanding provider
/// requests stays bounded no matter how many chats are active.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmClient>,
    qa_prompt: PromptDefinition,
    condense_prompt: PromptDefinition,
    permits: Arc<Semaphore>,
    options: SynthesisOptions,
}

#[derive(Serialize)]
struct CondenseData<'a> {
    question: &'a str,
    history: &'a [Turn],
}

impl AnswerSynthesizer {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        qa_prompt: PromptDefinition,
        condense_prompt: PromptDefinition,
        permits: Arc<Semaphore>,
        options: SynthesisOptions,
    ) -> Self {
        Self {
            llm,
            qa_prompt,
            condense_prompt,
            permits,
            options,
        }
    }

    /// Generate an answer from an assembled context.
    ///
    /// Failures surface as [`AppError::Generation`] once the retry budget is
    /// spent.
    #[instrument(skip(self, context), fields(documents = context.documents.len()))]
    pub async fn synthesize(&self, context: PromptContext) -> AppResult<SynthesizedAnswer> {
        let prompt = context.render(&self.qa_prompt)?;
        let text = self.generate(&prompt).await?;

        Ok(SynthesizedAnswer {
            text,
            documents: context.documents,
        })
    }

    /// Rewrite a follow-up into a standalone question.
    ///
    /// Without history the question is returned unchanged and the model is
    /// not called. An empty rewrite also falls back to the original.
    #[instrument(skip(self, question, history), fields(turns = history.len()))]
    pub async fn condense_question(&self, question: &str, history: &[Turn]) -> AppResult<String> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let prompt = build_prompt(&self.condense_prompt, &CondenseData { question, history })?;
        let standalone = self.generate(&prompt).await?;

        if standalone.is_empty() {
            return Ok(question.to_string());
        }

        debug!("Condensed follow-up into: {}", standalone);
        Ok(standalone)
    }

    async fn generate(&self, prompt: &BuiltPrompt) -> AppResult<String> {
        let mut request = LlmRequest::new(prompt.user.clone(), self.options.model.clone())
            .with_temperature(ANSWER_TEMPERATURE);
        if let Some(system) = &prompt.system {
            request = request.with_system(system.clone());
        }

        let mut attempt = 0;
        loop {
            match self.call_once(&request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.options.retries => {
                    attempt += 1;
                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                    warn!(
                        "Generation failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        self.options.retries + 1,
                        backoff_ms,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err(AppError::Generation(message)) => return Err(AppError::Generation(message)),
                Err(e) => return Err(AppError::Generation(e.to_string())),
            }
        }
    }

    async fn call_once(&self, request: &LlmRequest) -> AppResult<String> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AppError::Generation("generation limiter is closed".to_string()))?;

        let response = tokio::time::timeout(self.options.timeout, self.llm.complete(request))
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "{} did not answer within {:?}",
                    self.llm.provider_name(),
                    self.options.timeout
                ))
            })??;

        let text = response.content.trim().to_string();

        debug!(
            model = %response.model,
            tokens = response.usage.total_tokens,
            "Generation complete"
        );

        Ok(text)
    }
}
