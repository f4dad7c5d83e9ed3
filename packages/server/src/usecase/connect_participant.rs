//! UseCase: 参加者接続処理（入室）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 入室チェック（ルームの存在・定員・名前の重複）と、チェック通過後の登録処理
//!
//! ### なぜこのテストが必要か
//! - 定員 2 名を超える入室や同名の入室を防ぐ
//! - 入室拒否時に Presence Store と Connection Registry が変更されないことを保証
//! - 入室によって削除待ちのタイマーがキャンセルされることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：空きのあるルームへの入室
//! - 異常系：存在しないルーム・満室・同名・ストア障害
//! - エッジケース：登録直後にルームが削除されていた場合のロールバック
//! - エッジケース：猶予期間切れの削除処理の最中に入室した場合

use std::sync::Arc;

use crate::domain::{
    AdmissionError, ConnectionHandle, ConnectionMetadata, ConnectionRegistry, ParticipantName,
    PresenceStore, RoomCode,
};

use super::{error::ConnectError, eviction::RoomEvictionScheduler};

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Presence Store（共有ストアの抽象化）
    store: Arc<dyn PresenceStore>,
    /// Connection Registry（ライブな接続ハンドルの管理）
    registry: Arc<dyn ConnectionRegistry>,
    /// ルーム削除のスケジューラ
    eviction: Arc<RoomEvictionScheduler>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
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

    /// 参加者接続を実行
    ///
    /// 入室チェックと参加者の追加は別々のストア操作であり、アトミックではない。
    ///
    /// # Arguments
    ///
    /// * `room` - 入室するルームのコード
    /// * `name` - 参加者名（ルーム内で一意）
    /// * `handle` - 参加者へのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionMetadata)` - 入室成功（登録された接続のメタデータ）
    /// * `Err(ConnectError)` - 入室拒否またはストア障害
    pub async fn execute(
        &self,
        room: &RoomCode,
        name: &ParticipantName,
        handle: ConnectionHandle,
    ) -> Result<ConnectionMetadata, ConnectError> {
        // 1. 入室チェック
        self.store.can_join(room, name).await?;

        // 2. 削除待ちのタイマーがあれば止める
        self.eviction.cancel(room).await;

        // 3. Connection Registry にハンドルを登録
        let metadata = self.registry.register(handle).await;

        // 4. Presence Store に参加者を追加
        if let Err(e) = self.store.add_member(room, name, &metadata).await {
            tracing::error!("Failed to add '{}' to room {}: {}", name, room, e);
            self.registry.unregister(&metadata.connection_id).await;
            return Err(ConnectError::StoreUnavailable(e));
        }

        // 5. 登録の間にルームが削除されていないか確認
        match self.store.is_room_active(room).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    "Room {} was deleted while '{}' was joining; rolling back",
                    room,
                    name
                );
                if let Err(e) = self.store.remove_member(room, name).await {
                    tracing::error!("Failed to roll back '{}' in room {}: {}", name, room, e);
                }
                self.registry.unregister(&metadata.connection_id).await;
                return Err(AdmissionError::RoomNotFound(room.clone()).into());
            }
            Err(e) => {
                tracing::warn!("Could not confirm room {} is still active: {}", room, e);
            }
        }

        tracing::info!("'{}' has joined room {}", name, room);
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use mockall::predicate::always;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        domain::{InstanceId, MockPresenceStore, PresenceError},
        infrastructure::{
            presence::InMemoryPresenceStore, registry::InMemoryConnectionRegistry,
        },
    };

    struct Fixture {
        store: Arc<InMemoryPresenceStore>,
        registry: Arc<InMemoryConnectionRegistry>,
        eviction: Arc<RoomEvictionScheduler>,
        usecase: ConnectParticipantUseCase,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryPresenceStore::new());
        store.create_room(&room()).await.unwrap();
        let registry = Arc::new(InMemoryConnectionRegistry::new(InstanceId::generate()));
        let eviction = Arc::new(RoomEvictionScheduler::new(
            store.clone(),
            Duration::from_secs(5),
        ));
        let usecase =
            ConnectParticipantUseCase::new(store.clone(), registry.clone(), eviction.clone());
        Fixture {
            store,
            registry,
            eviction,
            usecase,
        }
    }

    fn room() -> RoomCode {
        RoomCode::new("AB12C".to_string()).unwrap()
    }

    fn name(value: &str) -> ParticipantName {
        ParticipantName::new(value.to_string()).unwrap()
    }

    fn handle() -> ConnectionHandle {
        mpsc::unbounded_channel().0
    }

    #[tokio::test]
    async fn test_connect_participant_success() {
        // テスト項目: 新規参加者が入室でき、ストアとレジストリの両方に反映される
        // given (前提条件):
        let f = fixture().await;

        // when (操作):
        let result = f.usecase.execute(&room(), &name("alice"), handle()).await;

        // then (期待する結果):
        let metadata = result.unwrap();
        assert_eq!(metadata.instance_id, f.registry.instance_id());
        assert_eq!(f.store.room_occupancy(&room()).await.unwrap(), 1);
        assert_eq!(
            f.store.member_metadata(&room(), &name("alice")).await.unwrap(),
            metadata
        );
        assert_eq!(f.registry.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_connect_participant_room_not_found() {
        // テスト項目: 存在しないルームへの入室は RoomNotFound になり、何も登録されない
        // given (前提条件):
        let f = fixture().await;
        let missing = RoomCode::new("ZZZZZ".to_string()).unwrap();

        // when (操作):
        let result = f.usecase.execute(&missing, &name("alice"), handle()).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConnectError::Admission(AdmissionError::RoomNotFound(missing)))
        );
        assert_eq!(f.registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_connect_third_participant_room_full() {
        // テスト項目: 2 名在室のルームへの 3 人目の入室は RoomFull になり、メンバーは変わらない
        // given (前提条件):
        let f = fixture().await;
        f.usecase.execute(&room(), &name("alice"), handle()).await.unwrap();
        f.usecase.execute(&room(), &name("bob"), handle()).await.unwrap();

        // when (操作):
        let result = f.usecase.execute(&room(), &name("carol"), handle()).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConnectError::Admission(AdmissionError::RoomFull(room())))
        );
        let mut members = f.store.member_names(&room()).await.unwrap();
        members.sort();
        assert_eq!(members, vec![name("alice"), name("bob")]);
        assert_eq!(f.registry.connection_count().await, 2);
    }

    #[tokio::test]
    async fn test_connect_participant_duplicate_name() {
        // テスト項目: 同名の参加者がいるルームへの入室は DuplicateName になる
        // given (前提条件):
        let f = fixture().await;
        let first = f.usecase.execute(&room(), &name("alice"), handle()).await.unwrap();

        // when (操作):
        let result = f.usecase.execute(&room(), &name("alice"), handle()).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConnectError::Admission(AdmissionError::DuplicateName {
                room: room(),
                name: name("alice"),
            }))
        );
        // 既存の参加者のメタデータは上書きされていない
        assert_eq!(
            f.store.member_metadata(&room(), &name("alice")).await.unwrap(),
            first
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_cancels_pending_eviction() {
        // テスト項目: 削除待ちのルームに入室するとタイマーがキャンセルされ、ルームが残る
        // given (前提条件):
        let f = fixture().await;
        f.eviction.schedule(room()).await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        // when (操作):
        f.usecase.execute(&room(), &name("alice"), handle()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        // then (期待する結果):
        assert!(!f.eviction.is_pending(&room()).await);
        assert!(f.store.is_room_active(&room()).await.unwrap());
    }

    /// ルームの削除にだけ時間がかかるストア
    struct SlowDeleteStore {
        inner: InMemoryPresenceStore,
        delay: Duration,
    }

    #[async_trait]
    impl PresenceStore for SlowDeleteStore {
        async fn is_room_active(&self, room: &RoomCode) -> Result<bool, PresenceError> {
            self.inner.is_room_active(room).await
        }

        async fn create_room(&self, room: &RoomCode) -> Result<(), PresenceError> {
            self.inner.create_room(room).await
        }

        async fn delete_room(&self, room: &RoomCode) -> Result<(), PresenceError> {
            tokio::time::sleep(self.delay).await;
            self.inner.delete_room(room).await
        }

        async fn room_occupancy(&self, room: &RoomCode) -> Result<usize, PresenceError> {
            self.inner.room_occupancy(room).await
        }

        async fn add_member(
            &self,
            room: &RoomCode,
            name: &ParticipantName,
            metadata: &ConnectionMetadata,
        ) -> Result<(), PresenceError> {
            self.inner.add_member(room, name, metadata).await
        }

        async fn remove_member(
            &self,
            room: &RoomCode,
            name: &ParticipantName,
        ) -> Result<(), PresenceError> {
            self.inner.remove_member(room, name).await
        }

        async fn member_names(
            &self,
            room: &RoomCode,
        ) -> Result<Vec<ParticipantName>, PresenceError> {
            self.inner.member_names(room).await
        }

        async fn member_metadata(
            &self,
            room: &RoomCode,
            name: &ParticipantName,
        ) -> Result<ConnectionMetadata, PresenceError> {
            self.inner.member_metadata(room, name).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_during_expiry_is_not_admitted_into_deleted_room() {
        // テスト項目: 削除処理の途中で入室した参加者は、消えるルームに入室したことにならない
        // given (前提条件):
        // 期限切れのタイマーが在室人数 0 を確認し、時間のかかる削除を始めている
        let store = Arc::new(SlowDeleteStore {
            inner: InMemoryPresenceStore::new(),
            delay: Duration::from_secs(1),
        });
        store.create_room(&room()).await.unwrap();
        let registry = Arc::new(InMemoryConnectionRegistry::new(InstanceId::generate()));
        let eviction = Arc::new(RoomEvictionScheduler::new(
            store.clone(),
            Duration::from_secs(5),
        ));
        let usecase =
            ConnectParticipantUseCase::new(store.clone(), registry.clone(), eviction.clone());
        eviction.schedule(room()).await;
        tokio::time::sleep(Duration::from_millis(5100)).await;
        assert!(store.is_room_active(&room()).await.unwrap());

        // when (操作):
        let result = usecase.execute(&room(), &name("alice"), handle()).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConnectError::Admission(AdmissionError::RoomNotFound(room())))
        );
        assert!(!store.is_room_active(&room()).await.unwrap());
        assert_eq!(store.room_occupancy(&room()).await.unwrap(), 0);
        assert_eq!(registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_connect_store_failure_unregisters_handle() {
        // テスト項目: 参加者の追加に失敗した場合、登録したハンドルが解除される
        // given (前提条件):
        let mut store = MockPresenceStore::new();
        store.expect_can_join().returning(|_, _| Ok(()));
        store
            .expect_add_member()
            .with(always(), always(), always())
            .returning(|_, _, _| Err(PresenceError::Unavailable("broken pipe".to_string())));
        let store = Arc::new(store);
        let registry = Arc::new(InMemoryConnectionRegistry::new(InstanceId::generate()));
        let eviction = Arc::new(RoomEvictionScheduler::new(
            store.clone(),
            Duration::from_secs(5),
        ));
        let usecase = ConnectParticipantUseCase::new(store, registry.clone(), eviction);

        // when (操作):
        let result = usecase.execute(&room(), &name("alice"), handle()).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConnectError::StoreUnavailable(PresenceError::Unavailable(
                "broken pipe".to_string()
            )))
        );
        assert_eq!(result.unwrap_err().user_message(), "internal server error");
        assert_eq!(registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_connect_rolls_back_when_room_deleted_meanwhile() {
        // テスト項目: 追加後にルームが削除されていた場合、追加をロールバックして RoomNotFound
        // given (前提条件):
        let mut store = MockPresenceStore::new();
        store.expect_can_join().returning(|_, _| Ok(()));
        store.expect_add_member().returning(|_, _, _| Ok(()));
        store.expect_is_room_active().returning(|_| Ok(false));
        store.expect_remove_member().times(1).returning(|_, _| Ok(()));
        let store = Arc::new(store);
        let registry = Arc::new(InMemoryConnectionRegistry::new(InstanceId::generate()));
        let eviction = Arc::new(RoomEvictionScheduler::new(
            store.clone(),
            Duration::from_secs(5),
        ));
        let usecase = ConnectParticipantUseCase::new(store, registry.clone(), eviction);

        // when (操作):
        let result = usecase.execute(&room(), &name("alice"), handle()).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConnectError::Admission(AdmissionError::RoomNotFound(room())))
        );
        assert_eq!(registry.connection_count().await, 0);
    }

    #[test]
    fn test_user_message_for_rejections() {
        // テスト項目: 入室拒否の理由はそのまま利用者向けメッセージになる
        // given (前提条件):
        let error = ConnectError::Admission(AdmissionError::RoomFull(room()));

        // when (操作):
        let message = error.user_message();

        // then (期待する結果):
        assert_eq!(message, "room AB12C is full");
    }

    #[test]
    fn test_user_message_hides_store_details() {
        // テスト項目: ストア障害の詳細は利用者に伝えない
        // given (前提条件):
        let error = ConnectError::Admission(AdmissionError::Store(PresenceError::Unavailable(
            "10.0.0.7:6379 refused".to_string(),
        )));

        // when (操作):
        let message = error.user_message();

        // then (期待する結果):
        assert_eq!(message, "internal server error");
    }
}
