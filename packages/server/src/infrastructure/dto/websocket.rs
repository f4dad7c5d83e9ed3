//! WebSocket message DTOs
//!
//! 参加者間のペイロードは任意の JSON オブジェクトで、リレーは中身を解釈しません。
//! リレー自身が差し込むのはエラー通知 `{"type":"error","error":"..."}` だけです。

use serde::{Deserialize, Serialize};

/// Message type tag injected by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    Error,
}

/// Error notification written to a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub r#type: MessageType,
    pub error: String,
}

impl ErrorMessage {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::Error,
            error: error.into(),
        }
    }

    /// Encode as JSON text
    pub fn to_json(&self) -> String {
        // a struct of two strings always serializes
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"type":"error","error":"internal server error"}"#.to_string()
        })
    }
}
