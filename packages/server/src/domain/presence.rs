//! Presence Store trait 定義
//!
//! ルームの存在・在室人数・参加者ごとの接続メタデータを保持する共有ストアの
//! インターフェース。具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 整合性
//!
//! 各操作は単一キーの原子性のみを前提とします。複数キーにまたがるトランザクションは
//! 使わないため、入室チェックと参加者追加の間などには競合が起こりえます。
//! 全ての書き込み操作は冪等です。

use async_trait::async_trait;

use super::{
    entity::{ConnectionMetadata, ROOM_CAPACITY},
    error::{AdmissionError, PresenceError},
    value_object::{ParticipantName, RoomCode},
};

/// Presence Store trait
///
/// 複数のリレーインスタンスから同時に呼び出されても安全であること。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// ルームがアクティブなルームの集合に含まれているか
    async fn is_room_active(&self, room: &RoomCode) -> Result<bool, PresenceError>;

    /// ルームをアクティブな集合に追加（冪等）
    async fn create_room(&self, room: &RoomCode) -> Result<(), PresenceError>;

    /// ルームをアクティブな集合から外し、参加者情報も削除（冪等）
    async fn delete_room(&self, room: &RoomCode) -> Result<(), PresenceError>;

    /// 現在の参加者数
    async fn room_occupancy(&self, room: &RoomCode) -> Result<usize, PresenceError>;

    /// 参加者を追加（同名の参加者がいれば上書き）
    async fn add_member(
        &self,
        room: &RoomCode,
        name: &ParticipantName,
        metadata: &ConnectionMetadata,
    ) -> Result<(), PresenceError>;

    /// 参加者を削除（冪等）
    async fn remove_member(
        &self,
        room: &RoomCode,
        name: &ParticipantName,
    ) -> Result<(), PresenceError>;

    /// 全参加者名（順序は不定）
    async fn member_names(&self, room: &RoomCode) -> Result<Vec<ParticipantName>, PresenceError>;

    /// 参加者の接続メタデータ
    ///
    /// 参加者が存在しない場合は `PresenceError::MemberNotFound` を返す。
    async fn member_metadata(
        &self,
        room: &RoomCode,
        name: &ParticipantName,
    ) -> Result<ConnectionMetadata, PresenceError>;

    /// 入室可否のチェック
    ///
    /// - ルームがアクティブでなければ `RoomNotFound`
    /// - 在室人数が定員以上なら `RoomFull`
    /// - 同名の参加者がいれば `DuplicateName`
    ///
    /// チェックと実際の追加はアトミックではない。
    async fn can_join(&self, room: &RoomCode, name: &ParticipantName) -> Result<(), AdmissionError> {
        if !self.is_room_active(room).await? {
            return Err(AdmissionError::RoomNotFound(room.clone()));
        }
        if self.room_occupancy(room).await? >= ROOM_CAPACITY {
            return Err(AdmissionError::RoomFull(room.clone()));
        }
        if self.member_names(room).await?.contains(name) {
            return Err(AdmissionError::DuplicateName {
                room: room.clone(),
                name: name.clone(),
            });
        }
        Ok(())
    }
}
