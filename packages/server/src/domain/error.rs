//! Domain errors

use thiserror::Error;

use super::value_object::{ParticipantName, RoomCode};

/// Value Object のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("invalid room code '{0}': expected 5 characters from [A-Z0-9]")]
    InvalidRoomCode(String),

    #[error("invalid participant name '{0}'")]
    InvalidParticipantName(String),
}

/// Presence Store の操作エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenceError {
    /// The store could not be reached or rejected the command
    #[error("presence store unavailable: {0}")]
    Unavailable(String),

    #[error("member '{name}' not found in room {room}")]
    MemberNotFound {
        room: RoomCode,
        name: ParticipantName,
    },

    /// A stored value could not be decoded
    #[error("malformed presence data: {0}")]
    Malformed(String),
}

/// 入室可否チェックの失敗理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    #[error("room {0} is full")]
    RoomFull(RoomCode),

    #[error("name '{name}' is already taken in room {room}")]
    DuplicateName {
        room: RoomCode,
        name: ParticipantName,
    },

    #[error(transparent)]
    Store(#[from] PresenceError),
}

impl AdmissionError {
    /// Whether the failure is a user-facing rejection rather than an
    /// infrastructure fault.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, AdmissionError::Store(_))
    }
}
