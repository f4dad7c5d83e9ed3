//! UseCase errors

use thiserror::Error;

use crate::domain::{AdmissionError, ConnectionMetadata, InstanceId, ParticipantName, PresenceError};

/// ルーム作成のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateRoomError {
    #[error("failed to create room: {0}")]
    StoreUnavailable(#[from] PresenceError),
}

/// 参加者接続（入室）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    /// The member could not be persisted after admission passed
    #[error("failed to add participant to room: {0}")]
    StoreUnavailable(PresenceError),
}

impl ConnectError {
    /// Text written to the participant in the error envelope
    ///
    /// 入室拒否の理由はそのまま伝え、ストア障害の詳細は伝えない。
    pub fn user_message(&self) -> String {
        match self {
            ConnectError::Admission(e) if e.is_rejection() => e.to_string(),
            _ => "internal server error".to_string(),
        }
    }
}

/// ブロードキャストのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
    #[error("presence store unavailable: {0}")]
    StoreUnavailable(#[from] PresenceError),

    /// Metadata exists but no live handle is registered locally
    #[error("no live connection for '{0}'")]
    HandleNotFound(ParticipantName),

    /// The member's connection is owned by another relay instance
    #[error("connection for '{member}' is owned by instance {instance_id}")]
    RemoteConnection {
        member: ParticipantName,
        instance_id: InstanceId,
    },

    /// The member's handle rejected the write (its socket has closed)
    #[error("failed to write to '{0}'")]
    WriteFailed(ParticipantName),
}

/// ブロードキャストの失敗
///
/// `faulty_member` が `Some` の場合、そのメンバーの接続は死んでいるとみなし、
/// 呼び出し側はそのメンバーの退室処理を起動する。
/// `faulty_connection` はメタデータが読めた場合のみ入る。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct BroadcastFault {
    pub faulty_member: Option<ParticipantName>,
    pub faulty_connection: Option<ConnectionMetadata>,
    pub error: BroadcastError,
}

impl BroadcastFault {
    fn room_level(error: BroadcastError) -> Self {
        Self {
            faulty_member: None,
            faulty_connection: None,
            error,
        }
    }

    pub(crate) fn store(error: PresenceError) -> Self {
        Self::room_level(BroadcastError::StoreUnavailable(error))
    }

    pub(crate) fn member(
        member: ParticipantName,
        connection: Option<ConnectionMetadata>,
        error: BroadcastError,
    ) -> Self {
        Self {
            faulty_member: Some(member),
            faulty_connection: connection,
            error,
        }
    }
}

/// 退室処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisconnectError {
    /// The member is already gone (or the metadata could not be read)
    #[error("connection metadata unavailable: {0}")]
    MetadataUnavailable(PresenceError),

    /// The stored membership belongs to a newer connection
    #[error("membership belongs to another connection")]
    StaleConnection,

    #[error("presence store unavailable: {0}")]
    StoreUnavailable(PresenceError),
}
