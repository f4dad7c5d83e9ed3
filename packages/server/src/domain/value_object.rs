//! Value Objects
//!
//! ドメインで使う識別子を表す値オブジェクト。
//! 生成時にバリデーションを行い、不正な値がドメイン層に入り込まないようにします。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Length of every room code.
pub const ROOM_CODE_LENGTH: usize = 5;

/// Maximum length of a participant display name (in characters).
pub const PARTICIPANT_NAME_MAX_LENGTH: usize = 32;

/// Room code
///
/// 5 文字の英大文字・数字からなるルーム識別子。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Create a new RoomCode with validation
    ///
    /// # Errors
    ///
    /// Returns `ValueObjectError::InvalidRoomCode` unless the code is exactly
    /// [`ROOM_CODE_LENGTH`] characters from `[A-Z0-9]`.
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let valid = value.len() == ROOM_CODE_LENGTH
            && value
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        if !valid {
            return Err(ValueObjectError::InvalidRoomCode(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Participant display name
///
/// ルーム内で一意な参加者名。前後の空白は取り除かれます。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantName(String);

impl ParticipantName {
    /// Create a new ParticipantName with validation
    ///
    /// # Errors
    ///
    /// Returns `ValueObjectError::InvalidParticipantName` if the trimmed name
    /// is empty, longer than [`PARTICIPANT_NAME_MAX_LENGTH`] characters, or
    /// contains control characters.
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty()
            || trimmed.chars().count() > PARTICIPANT_NAME_MAX_LENGTH
            || trimmed.chars().any(char::is_control)
        {
            return Err(ValueObjectError::InvalidParticipantName(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ParticipantName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ParticipantName> for String {
    fn from(name: ParticipantName) -> Self {
        name.0
    }
}

impl fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connection identifier
///
/// 受け付けた接続ごとに発行される識別子。発行したインスタンスの中でのみ意味を持つ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Mint a fresh connection identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relay instance identifier
///
/// プロセス起動時に一度だけ発行され、接続メタデータの所有インスタンスを示す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Mint a fresh instance identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
