//! Message gate: decides which messages get an answer.

use crate::message::{ChatMessage, ChatType};

/// Outcome of gating one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Answer `question`, the message text with the trigger removed.
    Eligible { question: String },
    /// Not addressed to the bot; nothing runs and nothing is sent.
    Ignored,
}

/// Gate a message.
///
/// Private chats always pass, text untouched. In groups the message must
/// contain `trigger_token`; every occurrence is removed and the rest trimmed.
/// An empty token is contained in every text, so it admits every group
/// message (configuration validation rejects empty tokens).
pub fn decide(message: &ChatMessage, trigger_token: &str) -> GateDecision {
    match message.chat_type {
        ChatType::Private => GateDecision::Eligible {
            question: message.raw_text.clone(),
        },
        ChatType::Group | ChatType::Supergroup => {
            if !message.raw_text.contains(trigger_token) {
                tracing::trace!(chat_id = message.chat_id, "No trigger token, ignoring");
                return GateDecision::Ignored;
            }

            GateDecision::Eligible {
                question: message.raw_text.replace(trigger_token, "").trim().to_string(),
            }
        }
    }
}
