//! Reply formatting.

use serde::Serialize;

/// Sent when retrieval or generation fails; details go to the log only.
pub const FAILURE_REPLY: &str =
    "Sorry, I couldn't answer that right now. Please try again in a moment.";

/// Final answer for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedAnswer {
    pub text: String,
    /// Absent only when nothing was retrieved
    pub primary_source: Option<String>,
}

/// Render the chat reply: the answer, then a citation line when there is one.
pub fn format_reply(answer: &GeneratedAnswer) -> String {
    match &answer.primary_source {
        Some(source) => format!("{}\n\nSource: {}", answer.text, source),
        None => answer.text.clone(),
    }
}
