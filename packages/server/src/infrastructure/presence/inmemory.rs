//! InMemory Presence Store 実装
//!
//! ドメイン層が定義する PresenceStore trait の具体的な実装。
//! HashSet / HashMap をインメモリ DB として使用します。
//!
//! Redis 実装と同じく、アクティブなルームの集合と参加者のハッシュを別々に保持します。
//! そのため、アクティブでないルームへの `add_member` も（Redis の HSET と同様に）
//! 参加者ハッシュを作成します。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionMetadata, ParticipantName, PresenceError, PresenceStore, RoomCode};

#[derive(Default)]
struct PresenceTables {
    /// アクティブなルームの集合
    active_rooms: HashSet<RoomCode>,
    /// ルームごとの参加者名 → 接続メタデータ
    members: HashMap<RoomCode, HashMap<ParticipantName, ConnectionMetadata>>,
}

/// インメモリ Presence Store 実装
#[derive(Default)]
pub struct InMemoryPresenceStore {
    tables: Mutex<PresenceTables>,
}

impl InMemoryPresenceStore {
    /// 新しい InMemoryPresenceStore を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// アクティブなルーム数
    pub async fn active_room_count(&self) -> usize {
        self.tables.lock().await.active_rooms.len()
    }
}

#[async_trait]
impl PresenceStore for InMemoryPresenceStore {
    async fn is_room_active(&self, room: &RoomCode) -> Result<bool, PresenceError> {
        let tables = self.tables.lock().await;
        Ok(tables.active_rooms.contains(room))
    }

    async fn create_room(&self, room: &RoomCode) -> Result<(), PresenceError> {
        let mut tables = self.tables.lock().await;
        tables.active_rooms.insert(room.clone());
        Ok(())
    }

    async fn delete_room(&self, room: &RoomCode) -> Result<(), PresenceError> {
        let mut tables = self.tables.lock().await;
        tables.active_rooms.remove(room);
        tables.members.remove(room);
        Ok(())
    }

    async fn room_occupancy(&self, room: &RoomCode) -> Result<usize, PresenceError> {
        let tables = self.tables.lock().await;
        Ok(tables.members.get(room).map_or(0, HashMap::len))
    }

    async fn add_member(
        &self,
        room: &RoomCode,
        name: &ParticipantName,
        metadata: &ConnectionMetadata,
    ) -> Result<(), PresenceError> {
        let mut tables = self.tables.lock().await;
        tables
            .members
            .entry(room.clone())
            .or_default()
            .insert(name.clone(), *metadata);
        Ok(())
    }

    async fn remove_member(
        &self,
        room: &RoomCode,
        name: &ParticipantName,
    ) -> Result<(), PresenceError> {
        let mut tables = self.tables.lock().await;
        if let Some(members) = tables.members.get_mut(room) {
            members.remove(name);
            // Redis drops a hash once its last field is deleted
            if members.is_empty() {
                tables.members.remove(room);
            }
        }
        Ok(())
    }

    async fn member_names(&self, room: &RoomCode) -> Result<Vec<ParticipantName>, PresenceError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .members
            .get(room)
            .map(|members| members.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn member_metadata(
        &self,
        room: &RoomCode,
        name: &ParticipantName,
    ) -> Result<ConnectionMetadata, PresenceError> {
        let tables = self.tables.lock().await;
        tables
            .members
            .get(room)
            .and_then(|members| members.get(name))
            .copied()
            .ok_or_else(|| PresenceError::MemberNotFound {
                room: room.clone(),
                name: name.clone(),
            })
    }
}
