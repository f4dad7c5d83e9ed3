//! UseCase: ルーム状態の取得
//!
//! 運用時の確認とテスト用に、Presence Store 上のルームの状態をまとめて返します。

use std::sync::Arc;

use crate::domain::{ParticipantName, PresenceError, PresenceStore, RoomCode};

/// ルームの状態（Presence Store 上のスナップショット）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomState {
    pub code: RoomCode,
    pub active: bool,
    pub occupancy: usize,
    /// 名前順
    pub members: Vec<ParticipantName>,
}

pub struct GetRoomStateUseCase {
    store: Arc<dyn PresenceStore>,
}

impl GetRoomStateUseCase {
    pub fn new(store: Arc<dyn PresenceStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, code: RoomCode) -> Result<RoomState, PresenceError> {
        let active = self.store.is_room_active(&code).await?;
        let mut members = self.store.member_names(&code).await?;
        members.sort();

        Ok(RoomState {
            code,
            active,
            occupancy: members.len(),
            members,
        })
    }
}
