//! Built-in prompt definitions.
//!
//! Workspaces can override either prompt by dropping `<id>.yml` into
//! `.docsbot/prompts/`.

/// Grounded answering prompt.
pub const QA_PROMPT_ID: &str = "qa.grounded";

/// Follow-up question rewriting prompt.
pub const CONDENSE_PROMPT_ID: &str = "qa.condense";

const QA_PROMPT_YAML: &str = r#"
id: qa.grounded
title: Grounded documentation answer
apiVersion: "1.0"
system: |
  Use the following pieces of context to answer the user's question.
  If you don't know the answer, just say that you don't know, don't try to make up an answer.
template: |
  {{#each documents}}
  {{this}}

  {{/each}}
  {{#if history}}
  Conversation so far:
  {{#each history}}
  Human: {{this.question}}
  Assistant: {{this.answer}}
  {{/each}}

  {{/if}}
  Question: {{question}}
  Helpful Answer:
"#;

const CONDENSE_PROMPT_YAML: &str = r#"
id: qa.condense
title: Standalone question rewrite
apiVersion: "1.0"
template: |
  Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.

  Chat History:
  {{#each history}}
  Human: {{this.question}}
  Assistant: {{this.answer}}
  {{/each}}
  Follow Up Input: {{question}}
  Standalone question:
"#;

/// Raw YAML of a built-in prompt.
pub fn builtin_yaml(id: &str) -> Option<&'static str> {
    match id {
        QA_PROMPT_ID => Some(QA_PROMPT_YAML),
        CONDENSE_PROMPT_ID => Some(CONDENSE_PROMPT_YAML),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PromptDefinition;

    #[test]
    fn test_builtins_parse() {
        for id in [QA_PROMPT_ID, CONDENSE_PROMPT_ID] {
            let yaml = builtin_yaml(id).unwrap();
            let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
            assert_eq!(def.id, id);
        }
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(builtin_yaml("agent.ask.default").is_none());
    }
}
