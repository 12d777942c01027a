//! Prompt loader for YAML prompt definitions.

use crate::defaults::builtin_yaml;
use crate::types::PromptDefinition;
use docsbot_core::{AppError, AppResult};
use std::path::Path;

/// Load a prompt definition by ID.
///
/// An override file `<prompts_dir>/<id>.yml` wins; otherwise the built-in
/// definition is used.
///
/// # Arguments
/// * `prompts_dir` - Directory with prompt overrides (may not exist)
/// * `prompt_id` - Prompt identifier (e.g., "qa.grounded")
///
/// # Example
/// ```no_run
/// use docsbot_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new(".docsbot/prompts"), "qa.grounded")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir.join(format!("{}.yml", prompt_id));

    let (contents, origin) = if prompt_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);
        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;
        (contents, prompt_file.display().to_string())
    } else {
        let contents = builtin_yaml(prompt_id).ok_or_else(|| {
            AppError::Prompt(format!(
                "Prompt '{}' not found in {:?} and has no built-in default",
                prompt_id, prompts_dir
            ))
        })?;
        (contents.to_string(), "built-in".to_string())
    };

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML ({}): {}", origin, e))
    })?;

    validate_prompt(&definition, prompt_id)?;

    tracing::debug!("Loaded prompt: {} ({}, {})", definition.id, definition.title, origin);

    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition, expected_id: &str) -> AppResult<()> {
    if def.id != expected_id {
        return Err(AppError::Prompt(format!(
            "Prompt file for '{}' declares id '{}'",
            expected_id, def.id
        )));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{CONDENSE_PROMPT_ID, QA_PROMPT_ID};
    use std::fs;
    use tempfile::TempDir;

    fn write_override(dir: &Path, id: &str, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(format!("{}.yml", id)), body).unwrap();
    }

    #[test]
    fn test_builtin_when_no_override() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), QA_PROMPT_ID).unwrap();
        assert_eq!(prompt.id, QA_PROMPT_ID);
        assert!(prompt.system.is_some());

        let condense = load_prompt(temp_dir.path(), CONDENSE_PROMPT_ID).unwrap();
        assert!(condense.template.contains("Standalone question"));
    }

    #[test]
    fn test_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            QA_PROMPT_ID,
            r#"
id: qa.grounded
title: "Terse"
apiVersion: "1.1"
template: "Q: {{question}}"
"#,
        );

        let prompt = load_prompt(temp_dir.path(), QA_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Terse");
        assert!(prompt.system.is_none());
    }

    #[test]
    fn test_load_unknown_prompt() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_prompt(temp_dir.path(), "nonexistent").is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), QA_PROMPT_ID, "invalid: yaml: content:");
        assert!(load_prompt(temp_dir.path(), QA_PROMPT_ID).is_err());
    }

    #[test]
    fn test_mismatched_id_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            QA_PROMPT_ID,
            r#"
id: something.else
title: "Wrong"
apiVersion: "1.0"
template: "{{question}}"
"#,
        );
        assert!(load_prompt(temp_dir.path(), QA_PROMPT_ID).is_err());
    }
}
