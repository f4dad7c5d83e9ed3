//! UseCase: ルーム作成処理
//!
//! 未使用のコードが見つかるまでコードを生成し続け、見つかったコードでルームを作成します。
//! 36^5 のキー空間に対してアクティブなルーム数は十分小さいため、試行回数に上限は設けません。
//!
//! 作成したルームには削除のタイマーを仕掛けます。誰も入室しないまま期限が来たルームは削除され、
//! 最初の入室でタイマーはキャンセルされます。

use std::{sync::Arc, time::Duration};

use crate::domain::{PresenceStore, RoomCode, RoomCodeGenerator};

use super::{error::CreateRoomError, eviction::RoomEvictionScheduler};

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    /// Presence Store（共有ストアの抽象化）
    store: Arc<dyn PresenceStore>,
    /// ルームコードの生成器
    generator: Arc<dyn RoomCodeGenerator>,
    /// ルーム削除のスケジューラ
    eviction: Arc<RoomEvictionScheduler>,
    /// 誰も入室しないルームを残しておく時間
    unclaimed_ttl: Duration,
}

impl CreateRoomUseCase {
    /// 新しい CreateRoomUseCase を作成
    pub fn new(
        store: Arc<dyn PresenceStore>,
        generator: Arc<dyn RoomCodeGenerator>,
        eviction: Arc<RoomEvictionScheduler>,
        unclaimed_ttl: Duration,
    ) -> Self {
        Self {
            store,
            generator,
            eviction,
            unclaimed_ttl,
        }
    }

    /// ルーム作成を実行
    ///
    /// # Returns
    ///
    /// * `Ok(RoomCode)` - 作成されたルームのコード（生成時点でアクティブでなかったもの）
    /// * `Err(CreateRoomError)` - Presence Store の障害
    pub async fn execute(&self) -> Result<RoomCode, CreateRoomError> {
        let code = loop {
            let candidate = self.generator.generate();
            if !self.store.is_room_active(&candidate).await? {
                break candidate;
            }
            tracing::debug!("Room code {} is taken, generating another", candidate);
        };

        self.store.create_room(&code).await?;
        tracing::info!("Room {} created", code);
        self.eviction
            .schedule_after(code.clone(), self.unclaimed_ttl)
            .await;

        Ok(code)
    }
}
