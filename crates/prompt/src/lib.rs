//! Prompt system for docsbot.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Built-in defaults with per-workspace overrides
//! - Handlebars template rendering

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use defaults::{CONDENSE_PROMPT_ID, QA_PROMPT_ID};
pub use loader::load_prompt;
pub use types::{BuiltPrompt, PromptDefinition};
