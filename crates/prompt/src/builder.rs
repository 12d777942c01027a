//! Prompt builder for rendering templates with request data.

use crate::types::{BuiltPrompt, PromptDefinition};
use docsbot_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde::Serialize;

/// Build a prompt from a definition and template data.
///
/// Both the system and user templates are rendered against the same data,
/// so any serializable value works: a `serde_json::Value`, or a struct with
/// `question`, `documents` and `history` fields for the built-in prompts.
///
/// # Example
/// ```no_run
/// use docsbot_prompt::{build_prompt, PromptDefinition};
/// use serde_json::json;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let data = json!({ "question": "What is Rust?", "documents": [], "history": [] });
/// let built = build_prompt(&def, &data)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt<T: Serialize>(definition: &PromptDefinition, data: &T) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("user", &definition.template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let user = handlebars
        .render("user", data)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    let system = match &definition.system {
        Some(system_template) => {
            handlebars
                .register_template_string("system", system_template)
                .map_err(|e| {
                    AppError::Prompt(format!("Failed to register system template: {}", e))
                })?;
            let rendered = handlebars.render("system", data).map_err(|e| {
                AppError::Prompt(format!("Failed to render system template: {}", e))
            })?;
            Some(rendered.trim_end().to_string())
        }
        None => None,
    };

    Ok(BuiltPrompt {
        system,
        user,
        source_prompt_id: definition.id.clone(),
    })
}
