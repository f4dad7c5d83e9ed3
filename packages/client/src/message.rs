//! Messages exchanged between participants.
//!
//! The relay forwards any JSON object untouched; this client speaks a small
//! chat vocabulary on top of it.

use serde::{Deserialize, Serialize};
use tsunagi_server::infrastructure::dto::websocket::ErrorMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChatType {
    Chat,
}

/// Chat line sent by a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub r#type: ChatType,
    pub from: String,
    pub content: String,
    /// Unix timestamp in milliseconds
    pub sent_at: i64,
}

impl ChatMessage {
    pub fn new(from: impl Into<String>, content: impl Into<String>, sent_at: i64) -> Self {
        Self {
            r#type: ChatType::Chat,
            from: from.into(),
            content: content.into(),
            sent_at,
        }
    }
}

/// Inbound text frame, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Error notification written by the relay
    Error(ErrorMessage),
    Chat(ChatMessage),
    /// Any other payload the peer sent
    Other(String),
}

impl Inbound {
    pub fn parse(text: &str) -> Self {
        if let Ok(error) = serde_json::from_str::<ErrorMessage>(text) {
            return Inbound::Error(error);
        }
        if let Ok(chat) = serde_json::from_str::<ChatMessage>(text) {
            return Inbound::Chat(chat);
        }
        Inbound::Other(text.to_string())
    }
}
