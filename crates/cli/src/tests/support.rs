//! Shared fixtures for pipeline tests.

use crate::pipeline::{AnswerService, ServiceParts};
use async_trait::async_trait;
use docsbot_core::config::BotConfig;
use docsbot_core::{AppError, AppResult};
use docsbot_knowledge::embeddings::MockProvider;
use docsbot_knowledge::{DocumentChunk, InMemoryStore, RetrievalQuery, VectorStore};
use docsbot_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docsbot_prompt::{load_prompt, CONDENSE_PROMPT_ID, QA_PROMPT_ID};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const TRIGGER: &str = "@bot";

pub const CORPUS: &[(&str, &str)] = &[
    ("Chain X exposes its RPC endpoint at https://rpc.chain-x.example for mainnet.", "chains/x.md"),
    ("Validators must upgrade the node software before the next release.", "ops/validators.md"),
    ("To get started, create a wallet and fund it from the faucet.", "guide/getting-started.md"),
    ("Staking rewards are paid every epoch.", "guide/staking.md"),
    ("Bridge transfers settle after twelve confirmations.", "guide/bridge.md"),
];

/// Wraps a store and counts queries.
pub struct CountingStore {
    inner: Arc<dyn VectorStore>,
    calls: AtomicUsize,
    fail: bool,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn VectorStore>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing(inner: Arc<dyn VectorStore>) -> Self {
        Self {
            fail: true,
            ..Self::new(inner)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for CountingStore {
    fn name(&self) -> &str {
        "counting"
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    async fn query(&self, query: &RetrievalQuery) -> AppResult<Vec<DocumentChunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Store("corpus unavailable".to_string()));
        }
        self.inner.query(query).await
    }
}

/// LLM stub that records the highest number of overlapping calls.
#[derive(Default)]
pub struct GaugeLlm {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl GaugeLlm {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for GaugeLlm {
    fn provider_name(&self) -> &str {
        "gauge"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        Ok(LlmResponse {
            content: "gauge answer".to_string(),
            model: request.model.clone(),
            usage: LlmUsage::new(1, 2),
        })
    }
}

/// LLM stub that answers with the prompt's question line, after a short
/// varying delay, and panics on questions containing `boom`.
#[derive(Default)]
pub struct EchoLlm {
    calls: AtomicUsize,
}

#[async_trait]
impl LlmClient for EchoLlm {
    fn provider_name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis((n * 7 % 5) as u64)).await;

        let question = request
            .prompt
            .lines()
            .find_map(|line| line.strip_prefix("Question: "))
            .unwrap_or_default()
            .to_string();
        if question.contains("boom") {
            panic!("echo stub asked to fail");
        }

        Ok(LlmResponse {
            content: question,
            model: request.model.clone(),
            usage: LlmUsage::new(1, 1),
        })
    }
}

pub async fn corpus_store(rows: &[(&str, &str)]) -> Arc<dyn VectorStore> {
    let documents = rows
        .iter()
        .map(|(content, source)| DocumentChunk::new(*content, *source))
        .collect();
    Arc::new(
        InMemoryStore::from_documents(Arc::new(MockProvider::new(256)), documents)
            .await
            .unwrap(),
    )
}

pub fn bot_config() -> BotConfig {
    BotConfig {
        trigger_token: TRIGGER.to_string(),
        store_timeout_secs: 2,
        generation_timeout_secs: 2,
        ..Default::default()
    }
}

pub fn service(
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmClient>,
    bot: BotConfig,
) -> AnswerService {
    let dir = TempDir::new().unwrap();
    AnswerService::new(ServiceParts {
        store,
        llm,
        model: "mock-model".to_string(),
        qa_prompt: load_prompt(dir.path(), QA_PROMPT_ID).unwrap(),
        condense_prompt: load_prompt(dir.path(), CONDENSE_PROMPT_ID).unwrap(),
        bot,
    })
}
