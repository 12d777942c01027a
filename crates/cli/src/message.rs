//! Inbound chat messages.

use serde::{Deserialize, Serialize};

/// Kind of chat a message arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Private,
    Group,
    Supergroup,
}

impl ChatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatType::Private => "private",
            ChatType::Group => "group",
            ChatType::Supergroup => "supergroup",
        }
    }
}

impl std::fmt::Display for ChatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound text message, as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub chat_id: i64,
    pub chat_type: ChatType,
    #[serde(alias = "text")]
    pub raw_text: String,
    #[serde(default)]
    pub sender_id: i64,
}

impl ChatMessage {
    pub fn new(chat_id: i64, chat_type: ChatType, raw_text: impl Into<String>, sender_id: i64) -> Self {
        Self {
            chat_id,
            chat_type,
            raw_text: raw_text.into(),
            sender_id,
        }
    }

    /// A direct message, as sent by the `ask` command.
    pub fn private(raw_text: impl Into<String>) -> Self {
        Self::new(0, ChatType::Private, raw_text, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_line() {
        let line = r#"{"chat_id": -100123, "chat_type": "supergroup", "text": "@docsbot hi", "sender_id": 42}"#;
        let message: ChatMessage = serde_json::from_str(line).unwrap();
        assert_eq!(message.chat_type, ChatType::Supergroup);
        assert_eq!(message.raw_text, "@docsbot hi");
        assert_eq!(message.sender_id, 42);
    }

    #[test]
    fn test_unknown_chat_type_rejected() {
        let line = r#"{"chat_id": 1, "chat_type": "channel", "raw_text": "hi"}"#;
        assert!(serde_json::from_str::<ChatMessage>(line).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ChatType::Group.to_string(), "group");
    }
}
