//! Answering pipeline and the service object that runs it.
//!
//! ```text
//! Received -> Gated -> Retrieved -> Assembled -> Synthesized -> Attributed -> Replied
//!               \-> Ignored        \-> Failed (retrieval or generation error)
//! ```

use crate::gate::{decide, GateDecision};
use crate::message::ChatMessage;
use crate::reply::{format_reply, GeneratedAnswer, FAILURE_REPLY};
use crate::session::SessionRegistry;
use docsbot_core::config::BotConfig;
use docsbot_core::{AppConfig, AppError, AppResult};
use docsbot_knowledge::{
    assemble, open_store, select_primary, AnswerSynthesizer, RetrievalEngine, SynthesisOptions,
    Turn, VectorStore,
};
use docsbot_llm::{create_client, LlmClient};
use docsbot_prompt::{load_prompt, PromptDefinition, CONDENSE_PROMPT_ID, QA_PROMPT_ID};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};
use tracing::Instrument;
use uuid::Uuid;

/// Where a message currently is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Gated,
    Retrieved,
    Assembled,
    Synthesized,
    Attributed,
    Replied,
    Ignored,
    Failed,
}

/// Terminal result of handling one message.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// The gate dropped the message; send nothing.
    Ignored,
    /// Send this reply.
    Replied(String),
    /// Send `reply`; `error` is for the log.
    Failed { reply: String, error: AppError },
}

impl PipelineOutcome {
    /// Text to send back, if any.
    pub fn reply(&self) -> Option<&str> {
        match self {
            PipelineOutcome::Ignored => None,
            PipelineOutcome::Replied(reply) => Some(reply),
            PipelineOutcome::Failed { reply, .. } => Some(reply),
        }
    }
}

/// Collaborators and settings a service is built from.
pub struct ServiceParts {
    pub store: Arc<dyn VectorStore>,
    pub llm: Arc<dyn LlmClient>,
    pub model: String,
    pub qa_prompt: PromptDefinition,
    pub condense_prompt: PromptDefinition,
    pub bot: BotConfig,
}

/// Answers chat messages.
///
/// Cheap to clone; clones share the same store, model client, limiter and
/// sessions. Handles are built once in [`AnswerService::init`] and never
/// change afterwards.
#[derive(Clone)]
pub struct AnswerService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    trigger_token: String,
    retrieval: RetrievalEngine,
    synthesizer: AnswerSynthesizer,
    permits: Arc<Semaphore>,
    sessions: SessionRegistry,
    /// `true` while accepting messages; in-flight runs hold a read guard
    open: RwLock<bool>,
}

impl AnswerService {
    /// Build the service from configuration: open the corpus, create the
    /// model client and load prompts.
    pub async fn init(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let store = open_store(config).await?;
        tracing::info!("Corpus ready: {} chunks ({})", store.len(), store.name());

        let api_key = config.resolve_api_key(&config.provider);
        let endpoint = config.provider_endpoint();
        let llm = create_client(
            &config.provider,
            endpoint.as_deref(),
            api_key.as_deref(),
            Duration::from_secs(config.bot.generation_timeout_secs),
        )?;

        let prompts_dir = config.prompts_dir();
        let qa_prompt = load_prompt(&prompts_dir, QA_PROMPT_ID)?;
        let condense_prompt = load_prompt(&prompts_dir, CONDENSE_PROMPT_ID)?;

        tracing::info!(
            provider = llm.provider_name(),
            model = %config.model,
            "Answer service initialized"
        );

        Ok(Self::new(ServiceParts {
            store,
            llm,
            model: config.model.clone(),
            qa_prompt,
            condense_prompt,
            bot: config.bot.clone(),
        }))
    }

    /// Assemble a service from ready-made parts.
    pub fn new(parts: ServiceParts) -> Self {
        let bot = parts.bot;
        let permits = Arc::new(Semaphore::new(bot.max_concurrent_generations.max(1)));

        let retrieval = RetrievalEngine::new(
            parts.store,
            Duration::from_secs(bot.store_timeout_secs),
            bot.retrieval_retries,
        );
        let synthesizer = AnswerSynthesizer::new(
            parts.llm,
            parts.qa_prompt,
            parts.condense_prompt,
            permits.clone(),
            SynthesisOptions {
                model: parts.model,
                timeout: Duration::from_secs(bot.generation_timeout_secs),
                retries: bot.generation_retries,
            },
        );

        Self {
            inner: Arc::new(ServiceInner {
                trigger_token: bot.trigger_token,
                retrieval,
                synthesizer,
                permits,
                sessions: SessionRegistry::new(bot.history_window),
                open: RwLock::new(true),
            }),
        }
    }

    /// Handle one inbound message end to end.
    ///
    /// Never fails: errors become [`PipelineOutcome::Failed`] with a generic
    /// reply, and only this message is affected.
    pub async fn handle(&self, message: ChatMessage) -> PipelineOutcome {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "message",
            chat_id = message.chat_id,
            chat_type = %message.chat_type,
            request_id = %request_id
        );

        self.handle_inner(message).instrument(span).await
    }

    async fn handle_inner(&self, message: ChatMessage) -> PipelineOutcome {
        let open = self.inner.open.read().await;
        if !*open {
            return failed(AppError::Other("answer service is shut down".to_string()));
        }

        stage(PipelineStage::Received);
        let question = match decide(&message, &self.inner.trigger_token) {
            GateDecision::Eligible { question } => question,
            GateDecision::Ignored => {
                stage(PipelineStage::Ignored);
                return PipelineOutcome::Ignored;
            }
        };
        stage(PipelineStage::Gated);

        let session = self.inner.sessions.get_or_create(message.chat_id).await;
        let mut guard = session.lock().await;
        tracing::trace!(
            "Session {} (open since {}) acquired",
            session.chat_id(),
            session.created_at().to_rfc3339()
        );
        let history = guard.history();

        match self.answer(&question, &history).await {
            Ok(answer) => {
                let reply = format_reply(&answer);
                guard.record(Turn::new(question, answer.text));
                stage(PipelineStage::Replied);
                tracing::info!(
                    source = answer.primary_source.as_deref().unwrap_or("-"),
                    "Replied"
                );
                PipelineOutcome::Replied(reply)
            }
            Err(error) => {
                stage(PipelineStage::Failed);
                tracing::error!("Pipeline failed: {}", error);
                failed(error)
            }
        }
    }

    async fn answer(&self, question: &str, history: &[Turn]) -> AppResult<GeneratedAnswer> {
        let standalone = self
            .inner
            .synthesizer
            .condense_question(question, history)
            .await?;

        let retrieved = self.inner.retrieval.retrieve(&standalone).await?;
        stage(PipelineStage::Retrieved);

        let context = assemble(question, history, retrieved);
        stage(PipelineStage::Assembled);

        let synthesized = self.inner.synthesizer.synthesize(context).await?;
        stage(PipelineStage::Synthesized);

        let primary_source = select_primary(&synthesized.documents);
        stage(PipelineStage::Attributed);

        Ok(GeneratedAnswer {
            text: synthesized.text,
            primary_source,
        })
    }

    /// Stop accepting messages, wait for in-flight ones, drop all sessions.
    pub async fn shutdown(&self) {
        let mut open = self.inner.open.write().await;
        if !*open {
            return;
        }
        *open = false;
        self.inner.permits.close();

        let dropped = self.inner.sessions.clear().await;
        tracing::info!("Answer service stopped, {} chat sessions dropped", dropped);
    }

    /// Number of chats seen so far.
    pub async fn session_count(&self) -> usize {
        self.inner.sessions.len().await
    }
}

fn stage(stage: PipelineStage) {
    tracing::debug!(stage = ?stage, "Pipeline stage");
}

fn failed(error: AppError) -> PipelineOutcome {
    PipelineOutcome::Failed {
        reply: FAILURE_REPLY.to_string(),
        error,
    }
}
