//! Context assembly: question, history and retrieved chunks in one place.

use crate::types::RetrievedSet;
use docsbot_core::AppResult;
use docsbot_prompt::{build_prompt, BuiltPrompt, PromptDefinition};
use serde::{Deserialize, Serialize};

/// One earlier exchange in a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

impl Turn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Everything the model needs to answer one question.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptContext {
    pub question: String,
    pub history: Vec<Turn>,
    /// Retrieved chunks in relevance order
    pub documents: RetrievedSet,
}

#[derive(Serialize)]
struct TemplateData<'a> {
    question: &'a str,
    documents: Vec<&'a str>,
    history: &'a [Turn],
}

/// Combine a question with its history and retrieved chunks.
pub fn assemble(question: &str, history: &[Turn], retrieved: RetrievedSet) -> PromptContext {
    PromptContext {
        question: question.to_string(),
        history: history.to_vec(),
        documents: retrieved,
    }
}

impl PromptContext {
    /// Render the answering prompt; chunk contents keep retrieval order.
    pub fn render(&self, definition: &PromptDefinition) -> AppResult<BuiltPrompt> {
        let data = TemplateData {
            question: &self.question,
            documents: self.documents.iter().map(|d| d.content.as_str()).collect(),
            history: &self.history,
        };
        build_prompt(definition, &data)
    }
}
