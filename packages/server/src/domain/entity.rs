//! Entities
//!
//! 参加者の接続メタデータと、メタデータからライブな接続ハンドルへの解決結果。

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::value_object::{ConnectionId, InstanceId};

/// Maximum number of participants in a room
pub const ROOM_CAPACITY: usize = 2;

/// Live transport handle
///
/// 送信した文字列（JSON テキスト）は接続ごとの送信タスクが WebSocket に書き込む。
/// 受信側が閉じていれば送信は失敗する。
pub type ConnectionHandle = mpsc::UnboundedSender<String>;

/// Connection metadata persisted per room member
///
/// どのインスタンスが、どの接続 ID でその参加者のソケットを保持しているかを示す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionMetadata {
    pub instance_id: InstanceId,
    pub connection_id: ConnectionId,
}

impl ConnectionMetadata {
    pub fn new(instance_id: InstanceId, connection_id: ConnectionId) -> Self {
        Self {
            instance_id,
            connection_id,
        }
    }

    /// Whether this metadata was minted by the given instance
    pub fn is_owned_by(&self, instance_id: &InstanceId) -> bool {
        &self.instance_id == instance_id
    }
}

/// Result of resolving connection metadata to a live handle
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The handle lives in this process
    Local(ConnectionHandle),
    /// The connection is owned by another relay instance
    Remote(InstanceId),
    /// Owned by this instance but no longer registered (stale entry)
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_json_shape() {
        // テスト項目: 接続メタデータが instance_id と connection_id を持つ JSON になる
        // given (前提条件):
        let metadata = ConnectionMetadata::new(InstanceId::generate(), ConnectionId::generate());

        // when (操作):
        let json = serde_json::to_value(metadata).unwrap();

        // then (期待する結果):
        assert_eq!(json["instance_id"], metadata.instance_id.to_string());
        assert_eq!(json["connection_id"], metadata.connection_id.to_string());
        let decoded: ConnectionMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, metadata);
    }

    #[test]
    fn test_is_owned_by() {
        // テスト項目: 所有インスタンスの判定が正しく行われる
        // given (前提条件):
        let local = InstanceId::generate();
        let remote = InstanceId::generate();
        let metadata = ConnectionMetadata::new(local, ConnectionId::generate());

        // when (操作) / then (期待する結果):
        assert!(metadata.is_owned_by(&local));
        assert!(!metadata.is_owned_by(&remote));
    }
}
