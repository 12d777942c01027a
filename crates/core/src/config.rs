//! Configuration management for docsbot.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config files (.docsbot/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources override earlier ones.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 3] = ["openai", "ollama", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docsbot/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active LLM provider ("openai", "ollama", "mock")
    pub provider: String,

    /// Active model identifier
    pub model: String,

    /// Explicit API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Vector store settings
    pub store: StoreConfig,

    /// Chat bot behavior
    pub bot: BotConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        timeout: Option<u64>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
    Mock {
        model: Option<String>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::OpenAI { model, .. } | ProviderConfig::Ollama { model, .. } => model,
            ProviderConfig::Mock { model } => model.as_deref().unwrap_or("mock"),
        }
    }

    /// Custom endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ProviderConfig::OpenAI { endpoint, .. } => endpoint.as_deref(),
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.as_str()),
            ProviderConfig::Mock { .. } => None,
        }
    }
}

/// Read-only vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite corpus file; defaults to `.docsbot/corpus.db` in the workspace
    #[serde(rename = "datasetPath")]
    pub dataset_path: Option<PathBuf>,

    /// Embedding provider used for query vectors ("mock", "ollama", "openai")
    #[serde(rename = "embeddingProvider")]
    pub embedding_provider: String,

    #[serde(rename = "embeddingModel")]
    pub embedding_model: String,

    /// Must match the dimension the corpus was indexed with
    pub dimensions: usize,

    #[serde(rename = "embeddingEndpoint")]
    pub embedding_endpoint: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            embedding_provider: "mock".to_string(),
            embedding_model: "trigram-v1".to_string(),
            dimensions: 384,
            embedding_endpoint: None,
        }
    }
}

/// Chat bot behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Substring that addresses the bot in group chats (usually its handle)
    #[serde(rename = "triggerToken")]
    pub trigger_token: String,

    /// Number of previous (question, answer) turns kept per chat; 0 = stateless
    #[serde(rename = "historyWindow", default)]
    pub history_window: usize,

    /// Upper bound on simultaneous outbound LLM calls
    #[serde(rename = "maxConcurrentGenerations", default = "default_max_concurrent")]
    pub max_concurrent_generations: usize,

    #[serde(rename = "storeTimeoutSecs", default = "default_store_timeout")]
    pub store_timeout_secs: u64,

    #[serde(rename = "generationTimeoutSecs", default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,

    /// Extra attempts after a transient retrieval failure (0 or 1)
    #[serde(rename = "retrievalRetries", default = "default_retries")]
    pub retrieval_retries: u32,

    /// Extra attempts after a transient generation failure (0 or 1)
    #[serde(rename = "generationRetries", default = "default_retries")]
    pub generation_retries: u32,
}

fn default_max_concurrent() -> usize {
    4
}

fn default_store_timeout() -> u64 {
    15
}

fn default_generation_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    1
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trigger_token: "@docsbot".to_string(),
            history_window: 0,
            max_concurrent_generations: default_max_concurrent(),
            store_timeout_secs: default_store_timeout(),
            generation_timeout_secs: default_generation_timeout(),
            retrieval_retries: default_retries(),
            generation_retries: default_retries(),
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name).map(PathBuf::from)
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    store: Option<StoreConfig>,
    bot: Option<BotConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            api_key: None,
            log_level: None,
            log_json: false,
            verbose: false,
            no_color: false,
            llm: None,
            store: StoreConfig::default(),
            bot: BotConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `DOCSBOT_WORKSPACE`: Override workspace path
    /// - `DOCSBOT_CONFIG`: Path to config file
    /// - `DOCSBOT_PROVIDER`: LLM provider
    /// - `DOCSBOT_MODEL`: Model identifier
    /// - `DOCSBOT_API_KEY`: API key
    /// - `DOCSBOT_DATASET_PATH`: SQLite corpus path
    /// - `DOCSBOT_TRIGGER_TOKEN`: Group chat trigger token
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], with the workspace and config file chosen
    /// by the caller (usually CLI flags) ahead of their environment variables.
    ///
    /// Both are resolved before any YAML is read, so `config_file` is the
    /// file that gets merged and `workspace` decides where the default
    /// `.docsbot/config.yaml` is looked up.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env_path("DOCSBOT_WORKSPACE")) {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env_path("DOCSBOT_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.docsbot_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("DOCSBOT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("DOCSBOT_MODEL") {
            config.model = model;
        }

        if let Ok(path) = std::env::var("DOCSBOT_DATASET_PATH") {
            config.store.dataset_path = Some(PathBuf::from(path));
        }

        if let Ok(token) = std::env::var("DOCSBOT_TRIGGER_TOKEN") {
            config.bot.trigger_token = token;
        }

        config.api_key = std::env::var("DOCSBOT_API_KEY").ok();
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(store) = config_file.store {
            result.store = store;
        }

        if let Some(bot) = config_file.bot {
            result.bot = bot;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    /// Workspace and config file are not here: pass them to
    /// [`AppConfig::load_with`] so they apply before the YAML is merged.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .docsbot directory.
    pub fn docsbot_dir(&self) -> PathBuf {
        self.workspace.join(".docsbot")
    }

    /// Directory holding prompt template overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.docsbot_dir().join("prompts")
    }

    /// Path of the read-only SQLite corpus.
    pub fn dataset_path(&self) -> PathBuf {
        self.store
            .dataset_path
            .clone()
            .unwrap_or_else(|| self.docsbot_dir().join("corpus.db"))
    }

    /// Get the configuration block for a provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint override for the active provider.
    pub fn provider_endpoint(&self) -> Option<String> {
        self.get_provider_config(&self.provider)
            .and_then(|pc| pc.endpoint())
            .map(str::to_string)
    }

    /// Resolve API key for a provider.
    ///
    /// `DOCSBOT_API_KEY` wins; otherwise the provider's `apiKeyEnv` is read.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => std::env::var(api_key_env).ok(),
            _ if provider == "openai" => std::env::var("OPENAI_API_KEY").ok(),
            _ => None,
        }
    }

    /// Validate configuration for the active provider and bot policy.
    pub fn validate(&self) -> AppResult<()> {
        let provider = &self.provider;

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "openai" && self.resolve_api_key(provider).is_none() {
            return Err(AppError::Config(
                "API key not found for provider openai (set DOCSBOT_API_KEY or apiKeyEnv)"
                    .to_string(),
            ));
        }

        if self.bot.trigger_token.trim().is_empty() {
            return Err(AppError::Config(
                "Trigger token must not be empty".to_string(),
            ));
        }

        if self.bot.max_concurrent_generations == 0 {
            return Err(AppError::Config(
                "maxConcurrentGenerations must be at least 1".to_string(),
            ));
        }

        if self.bot.retrieval_retries > 1 || self.bot.generation_retries > 1 {
            return Err(AppError::Config(
                "Retry budgets are limited to a single retry".to_string(),
            ));
        }

        if self.bot.store_timeout_secs == 0 || self.bot.generation_timeout_secs == 0 {
            return Err(AppError::Config("Timeouts must be non-zero".to_string()));
        }

        if self.store.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}
