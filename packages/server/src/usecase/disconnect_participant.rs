//! UseCase: 参加者の退室処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - Presence Store・Connection Registry からの削除と、空室時の削除タイマー起動
//!
//! ### なぜこのテストが必要か
//! - 退室後もルームに残るメンバーがいればルームが維持されることを保証
//! - 最後のメンバーの退室で、即時削除ではなく猶予期間付きの削除が予約されることを確認
//! - 同名で再入室した新しい接続を、古い接続の退室処理が消さないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：2 名中 1 名の退室、最後のメンバーの退室
//! - 異常系：既に退室済み・ストア障害
//! - エッジケース：古い接続の退室処理（StaleConnection）、他インスタンスの接続

use std::sync::Arc;

use crate::domain::{
    ConnectionMetadata, ConnectionRegistry, ParticipantName, PresenceStore, RoomCode,
};

use super::{error::DisconnectError, eviction::RoomEvictionScheduler};

/// 退室処理の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownOutcome {
    /// まだメンバーがいるためルームを維持
    RoomRetained { occupancy: usize },
    /// 空室になったため削除タイマーを起動
    EvictionScheduled,
}

/// 参加者退室のユースケース
pub struct DisconnectParticipantUseCase {
    /// Presence Store（共有ストアの抽象化）
    store: Arc<dyn PresenceStore>,
    /// Connection Registry（ライブな接続ハンドルの管理）
    registry: Arc<dyn ConnectionRegistry>,
    /// ルーム削除のスケジューラ
    eviction: Arc<RoomEvictionScheduler>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(
        store: Arc<dyn PresenceStore>,
        registry: Arc<dyn ConnectionRegistry>,
        eviction: Arc<RoomEvictionScheduler>,
    ) -> Self {
        Self {
            store,
            registry,
            eviction,
        }
    }

    /// 参加者の退室を実行
    ///
    /// `expected` を渡した場合、ストア上のメタデータが別の接続のものであれば
    /// 何も削除せずに `StaleConnection` を返す。
    /// どの経路でも、`expected` が自インスタンスの接続ならレジストリからは外す。
    ///
    /// 失敗はログに残すだけで再試行しない（ベストエフォート）。
    ///
    /// # Returns
    ///
    /// * `Ok(TeardownOutcome)` - 退室完了とルームの扱い
    /// * `Err(DisconnectError)` - 中断した理由
    pub async fn execute(
        &self,
        room: &RoomCode,
        name: &ParticipantName,
        expected: Option<ConnectionMetadata>,
    ) -> Result<TeardownOutcome, DisconnectError> {
        // 1. ストア上の接続メタデータを取得
        let stored = match self.store.member_metadata(room, name).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("Teardown of '{}' in room {} aborted: {}", name, room, e);
                self.release_expected(expected).await;
                return Err(DisconnectError::MetadataUnavailable(e));
            }
        };

        // 2. 別の接続のメンバーシップなら触らない
        if let Some(expected) = expected
            && expected.connection_id != stored.connection_id
        {
            tracing::warn!(
                "Teardown of '{}' in room {} skipped: membership now belongs to connection '{}'",
                name,
                room,
                stored.connection_id
            );
            self.release_expected(Some(expected)).await;
            return Err(DisconnectError::StaleConnection);
        }

        // 3. Presence Store から削除
        self.store
            .remove_member(room, name)
            .await
            .map_err(|e| {
                tracing::error!("Failed to remove '{}' from room {}: {}", name, room, e);
                DisconnectError::StoreUnavailable(e)
            })?;

        // 4. 自インスタンスの接続ならレジストリから削除
        if stored.is_owned_by(&self.registry.instance_id()) {
            self.registry.unregister(&stored.connection_id).await;
        }
        tracing::info!("'{}' has left room {}", name, room);

        // 5. 在室人数を確認し、空なら削除タイマーを起動
        let occupancy = self.store.room_occupancy(room).await.map_err(|e| {
            tracing::error!("Failed to read occupancy of room {}: {}", room, e);
            DisconnectError::StoreUnavailable(e)
        })?;
        if occupancy > 0 {
            return Ok(TeardownOutcome::RoomRetained { occupancy });
        }

        self.eviction.schedule(room.clone()).await;
        Ok(TeardownOutcome::EvictionScheduled)
    }

    async fn release_expected(&self, expected: Option<ConnectionMetadata>) {
        if let Some(expected) = expected
            && expected.is_owned_by(&self.registry.instance_id())
        {
            self.registry.unregister(&expected.connection_id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        domain::{ConnectionId, InstanceId, MockPresenceStore, PresenceError},
        infrastructure::{
            presence::InMemoryPresenceStore, registry::InMemoryConnectionRegistry,
        },
    };

    const GRACE: Duration = Duration::from_secs(5);

    struct Fixture {
        store: Arc<InMemoryPresenceStore>,
        registry: Arc<InMemoryConnectionRegistry>,
        eviction: Arc<RoomEvictionScheduler>,
        usecase: DisconnectParticipantUseCase,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = Arc::new(InMemoryPresenceStore::new());
            store.create_room(&room()).await.unwrap();
            let registry = Arc::new(InMemoryConnectionRegistry::new(InstanceId::generate()));
            let eviction = Arc::new(RoomEvictionScheduler::new(store.clone(), GRACE));
            let usecase =
                DisconnectParticipantUseCase::new(store.clone(), registry.clone(), eviction.clone());
            Self {
                store,
                registry,
                eviction,
                usecase,
            }
        }

        async fn join(&self, member: &str) -> ConnectionMetadata {
            let (tx, _rx) = mpsc::unbounded_channel();
            let metadata = self.registry.register(tx).await;
            self.store
                .add_member(&room(), &name(member), &metadata)
                .await
                .unwrap();
            metadata
        }
    }

    fn room() -> RoomCode {
        RoomCode::new("AB12C".to_string()).unwrap()
    }

    fn name(value: &str) -> ParticipantName {
        ParticipantName::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_disconnect_retains_room_with_remaining_member() {
        // テスト項目: 他のメンバーが残っている場合、ルームは維持され削除タイマーも起動しない
        // given (前提条件):
        let f = Fixture::new().await;
        let alice = f.join("alice").await;
        f.join("bob").await;

        // when (操作):
        let result = f.usecase.execute(&room(), &name("alice"), Some(alice)).await;

        // then (期待する結果):
        assert_eq!(result, Ok(TeardownOutcome::RoomRetained { occupancy: 1 }));
        assert_eq!(f.store.member_names(&room()).await.unwrap(), vec![name("bob")]);
        assert_eq!(f.registry.connection_count().await, 1);
        assert!(!f.eviction.is_pending(&room()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_last_member_schedules_eviction() {
        // テスト項目: 最後のメンバーの退室でタイマーが起動し、猶予期間後にルームが削除される
        // given (前提条件):
        let f = Fixture::new().await;
        let alice = f.join("alice").await;

        // when (操作):
        let result = f.usecase.execute(&room(), &name("alice"), Some(alice)).await;

        // then (期待する結果):
        assert_eq!(result, Ok(TeardownOutcome::EvictionScheduled));
        assert!(f.eviction.is_pending(&room()).await);
        assert!(f.store.is_room_active(&room()).await.unwrap());

        tokio::time::sleep(GRACE + Duration::from_millis(100)).await;
        assert!(!f.store.is_room_active(&room()).await.unwrap());
    }

    #[tokio::test]
    async fn test_disconnect_already_removed_member() {
        // テスト項目: 既に退室済みのメンバーの退室処理は中断され、レジストリからは外される
        // given (前提条件):
        let f = Fixture::new().await;
        let alice = f.join("alice").await;
        f.store.remove_member(&room(), &name("alice")).await.unwrap();

        // when (操作):
        let result = f.usecase.execute(&room(), &name("alice"), Some(alice)).await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(DisconnectError::MetadataUnavailable(PresenceError::MemberNotFound { .. }))
        ));
        assert_eq!(f.registry.connection_count().await, 0);
        assert!(!f.eviction.is_pending(&room()).await);
    }

    #[tokio::test]
    async fn test_disconnect_stale_connection_keeps_new_membership() {
        // テスト項目: 同名で再入室した新しい接続のメンバーシップは古い退室処理で消えない
        // given (前提条件):
        let f = Fixture::new().await;
        let old = f.join("alice").await;
        let new = f.join("alice").await;

        // when (操作):
        let result = f.usecase.execute(&room(), &name("alice"), Some(old)).await;

        // then (期待する結果):
        assert_eq!(result, Err(DisconnectError::StaleConnection));
        assert_eq!(
            f.store.member_metadata(&room(), &name("alice")).await.unwrap(),
            new
        );
        // 古い接続だけがレジストリから外れる
        assert_eq!(f.registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_disconnect_remote_member_is_not_unregistered_locally() {
        // テスト項目: 他インスタンスの接続はストアから削除されるが、ローカルのレジストリには触れない
        // given (前提条件):
        let f = Fixture::new().await;
        f.join("alice").await;
        let remote = ConnectionMetadata::new(InstanceId::generate(), ConnectionId::generate());
        f.store
            .add_member(&room(), &name("bob"), &remote)
            .await
            .unwrap();

        // when (操作):
        let result = f.usecase.execute(&room(), &name("bob"), None).await;

        // then (期待する結果):
        assert_eq!(result, Ok(TeardownOutcome::RoomRetained { occupancy: 1 }));
        assert_eq!(f.registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_disconnect_remove_failure() {
        // テスト項目: 削除に失敗した場合は中断し、タイマーは起動しない
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new(InstanceId::generate()));
        let metadata = ConnectionMetadata::new(registry.instance_id(), ConnectionId::generate());
        let mut store = MockPresenceStore::new();
        store
            .expect_member_metadata()
            .returning(move |_, _| Ok(metadata));
        store
            .expect_remove_member()
            .returning(|_, _| Err(PresenceError::Unavailable("reset by peer".to_string())));
        store.expect_room_occupancy().never();
        let store = Arc::new(store);
        let eviction = Arc::new(RoomEvictionScheduler::new(store.clone(), GRACE));
        let usecase = DisconnectParticipantUseCase::new(store, registry, eviction.clone());

        // when (操作):
        let result = usecase.execute(&room(), &name("alice"), Some(metadata)).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(DisconnectError::StoreUnavailable(PresenceError::Unavailable(
                "reset by peer".to_string()
            )))
        );
        assert_eq!(eviction.pending_count().await, 0);
    }
}
