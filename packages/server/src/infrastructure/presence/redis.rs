//! Redis Presence Store 実装
//!
//! ## キー構成
//!
//! ```text
//! {prefix}:rooms          SET   アクティブなルームコード
//! {prefix}:room:{code}    HASH  参加者名 → 接続メタデータ（JSON）
//! ```
//!
//! 各操作は単一のコマンドで完結するため、Redis のコマンド単位の原子性のみに依存します。
//! `delete_room` だけは SET と HASH の両方を MULTI/EXEC でまとめて削除します。

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};

use crate::domain::{ConnectionMetadata, ParticipantName, PresenceError, PresenceStore, RoomCode};

impl From<redis::RedisError> for PresenceError {
    fn from(e: redis::RedisError) -> Self {
        PresenceError::Unavailable(e.to_string())
    }
}

/// Redis key layout for one deployment
#[derive(Debug, Clone)]
struct KeySpace {
    prefix: String,
}

impl KeySpace {
    fn active_rooms(&self) -> String {
        format!("{}:rooms", self.prefix)
    }

    fn room_members(&self, room: &RoomCode) -> String {
        format!("{}:room:{}", self.prefix, room)
    }
}

fn encode_metadata(metadata: &ConnectionMetadata) -> Result<String, PresenceError> {
    serde_json::to_string(metadata).map_err(|e| PresenceError::Malformed(e.to_string()))
}

fn decode_metadata(raw: &str) -> Result<ConnectionMetadata, PresenceError> {
    serde_json::from_str(raw).map_err(|e| PresenceError::Malformed(e.to_string()))
}

/// Redis を使った Presence Store 実装
///
/// `ConnectionManager` は自動再接続する多重化コネクションで、clone しても同じ接続を共有する。
pub struct RedisPresenceStore {
    conn: ConnectionManager,
    keys: KeySpace,
}

impl RedisPresenceStore {
    /// Redis に接続し、PING で疎通を確認する
    ///
    /// # Errors
    ///
    /// URL が不正な場合、または接続・PING に失敗した場合は
    /// `PresenceError::Unavailable` を返す。
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self, PresenceError> {
        let client = redis::Client::open(url)?;
        let mut conn = client.get_connection_manager().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::debug!("Redis answered {} at {}", pong, url);

        Ok(Self {
            conn,
            keys: KeySpace {
                prefix: key_prefix.into(),
            },
        })
    }
}

#[async_trait]
impl PresenceStore for RedisPresenceStore {
    async fn is_room_active(&self, room: &RoomCode) -> Result<bool, PresenceError> {
        let mut conn = self.conn.clone();
        let active: bool = conn
            .sismember(self.keys.active_rooms(), room.as_str())
            .await?;
        Ok(active)
    }

    async fn create_room(&self, room: &RoomCode) -> Result<(), PresenceError> {
        let mut conn = self.conn.clone();
        let _: () = conn.sadd(self.keys.active_rooms(), room.as_str()).await?;
        Ok(())
    }

    async fn delete_room(&self, room: &RoomCode) -> Result<(), PresenceError> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .srem(self.keys.active_rooms(), room.as_str())
            .ignore()
            .del(self.keys.room_members(room))
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn room_occupancy(&self, room: &RoomCode) -> Result<usize, PresenceError> {
        let mut conn = self.conn.clone();
        let occupancy: usize = conn.hlen(self.keys.room_members(room)).await?;
        Ok(occupancy)
    }

    async fn add_member(
        &self,
        room: &RoomCode,
        name: &ParticipantName,
        metadata: &ConnectionMetadata,
    ) -> Result<(), PresenceError> {
        let encoded = encode_metadata(metadata)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(self.keys.room_members(room), name.as_str(), encoded)
            .await?;
        Ok(())
    }

    async fn remove_member(
        &self,
        room: &RoomCode,
        name: &ParticipantName,
    ) -> Result<(), PresenceError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .hdel(self.keys.room_members(room), name.as_str())
            .await?;
        Ok(())
    }

    async fn member_names(&self, room: &RoomCode) -> Result<Vec<ParticipantName>, PresenceError> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn.hkeys(self.keys.room_members(room)).await?;
        raw.into_iter()
            .map(|name| ParticipantName::new(name).map_err(|e| PresenceError::Malformed(e.to_string())))
            .collect()
    }

    async fn member_metadata(
        &self,
        room: &RoomCode,
        name: &ParticipantName,
    ) -> Result<ConnectionMetadata, PresenceError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .hget(self.keys.room_members(room), name.as_str())
            .await?;
        match raw {
            Some(raw) => decode_metadata(&raw),
            None => Err(PresenceError::MemberNotFound {
                room: room.clone(),
                name: name.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, InstanceId};

    #[test]
    fn test_key_space_layout() {
        // テスト項目: キーがプレフィックス付きで構成される
        // given (前提条件):
        let keys = KeySpace {
            prefix: "tsunagi".to_string(),
        };
        let room = RoomCode::new("AB12C".to_string()).unwrap();

        // when (操作) / then (期待する結果):
        assert_eq!(keys.active_rooms(), "tsunagi:rooms");
        assert_eq!(keys.room_members(&room), "tsunagi:room:AB12C");
    }

    #[test]
    fn test_metadata_codec() {
        // テスト項目: 接続メタデータを JSON で保存し、同じ値に復元できる
        // given (前提条件):
        let metadata = ConnectionMetadata::new(InstanceId::generate(), ConnectionId::generate());

        // when (操作):
        let encoded = encode_metadata(&metadata).unwrap();
        let decoded = decode_metadata(&encoded).unwrap();

        // then (期待する結果):
        assert_eq!(decoded, metadata);
    }

    #[test]
    fn test_decode_malformed_metadata() {
        // テスト項目: 壊れたメタデータは Malformed エラーになる
        // given (前提条件):
        let raw = r#"{"instance_id":"not-a-uuid"}"#;

        // when (操作):
        let result = decode_metadata(raw);

        // then (期待する結果):
        assert!(matches!(result, Err(PresenceError::Malformed(_))));
    }

    #[test]
    fn test_redis_error_maps_to_unavailable() {
        // テスト項目: Redis のエラーは Unavailable に変換される
        // given (前提条件):
        let error = redis::RedisError::from((redis::ErrorKind::IoError, "connection refused"));

        // when (操作):
        let presence_error = PresenceError::from(error);

        // then (期待する結果):
        assert!(matches!(presence_error, PresenceError::Unavailable(_)));
    }
}
