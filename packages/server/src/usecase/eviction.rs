//! UseCase: 猶予期間付きのルーム削除
//!
//! 在室人数が 0 になったルームをすぐには削除せず、猶予期間のタイマーを起動します。
//!
//! - 猶予期間内にそのルームへの入室があればタイマーはキャンセルされる
//! - 期限が来たら在室人数を一度だけ再確認し、0 のままならルームを削除する
//! - 削除の処理中に来た入室は、削除が終わるまで `cancel` で待たされる
//!
//! 一時的な切断からの再接続でルームの状態が失われないようにするための仕組みで、
//! ベストエフォートです。他インスタンス経由の入室はキャンセルできませんが、
//! 期限時の再確認で在室人数が 0 でなければ削除しません。

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{sync::Mutex, task::AbortHandle};

use crate::domain::{PresenceStore, RoomCode};

/// 起動中のタイマー
struct PendingEviction {
    /// 同じルームに対して再スケジュールされたタイマーを区別するための世代番号
    generation: u64,
    handle: AbortHandle,
}

/// ルーム削除のスケジューラ
pub struct RoomEvictionScheduler {
    store: Arc<dyn PresenceStore>,
    grace_period: Duration,
    pending: Mutex<HashMap<RoomCode, PendingEviction>>,
    next_generation: AtomicU64,
}

impl RoomEvictionScheduler {
    /// 新しい RoomEvictionScheduler を作成
    pub fn new(store: Arc<dyn PresenceStore>, grace_period: Duration) -> Self {
        Self {
            store,
            grace_period,
            pending: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    /// 猶予期間のタイマーを起動する
    ///
    /// 既にタイマーが動いているルームでは、古いタイマーを止めて新しく起動し直す。
    /// タイマーは呼び出し元から切り離されたタスクで動く。
    pub async fn schedule(self: &Arc<Self>, room: RoomCode) {
        self.schedule_after(room, self.grace_period).await;
    }

    /// 猶予期間の代わりに `delay` を使ってタイマーを起動する
    pub async fn schedule_after(self: &Arc<Self>, room: RoomCode, delay: Duration) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let scheduler = Arc::clone(self);
        let room_for_timer = room.clone();

        let mut pending = self.pending.lock().await;
        let task = tokio::spawn(async move {
            scheduler.expire(room_for_timer, generation, delay).await
        });
        let previous = pending.insert(
            room.clone(),
            PendingEviction {
                generation,
                handle: task.abort_handle(),
            },
        );
        if let Some(previous) = previous {
            previous.handle.abort();
        }

        tracing::info!(
            "Room {} is empty; deleting it in {:?} unless someone joins",
            room,
            delay
        );
    }

    /// タイマーをキャンセルする
    ///
    /// キャンセルしたタイマーがあれば `true` を返す。
    pub async fn cancel(&self, room: &RoomCode) -> bool {
        let mut pending = self.pending.lock().await;
        match pending.remove(room) {
            Some(eviction) => {
                eviction.handle.abort();
                tracing::info!("Eviction of room {} cancelled", room);
                true
            }
            None => false,
        }
    }

    /// タイマーが動いているか
    pub async fn is_pending(&self, room: &RoomCode) -> bool {
        self.pending.lock().await.contains_key(room)
    }

    /// 動いているタイマーの数
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    async fn expire(&self, room: RoomCode, generation: u64, delay: Duration) {
        tokio::time::sleep(delay).await;

        // held until the deletion finishes; `cancel` from an admission waits here
        let mut pending = self.pending.lock().await;
        match pending.get(&room) {
            Some(eviction) if eviction.generation == generation => {
                pending.remove(&room);
            }
            // superseded or cancelled
            _ => return,
        }

        match self.store.room_occupancy(&room).await {
            Ok(0) => match self.store.delete_room(&room).await {
                Ok(()) => tracing::info!("Room {} deleted after grace period", room),
                Err(e) => tracing::error!("Failed to delete room {}: {}", room, e),
            },
            Ok(occupancy) => {
                tracing::debug!(
                    "Room {} has {} member(s) again; keeping it",
                    room,
                    occupancy
                );
            }
            Err(e) => {
                tracing::error!("Failed to re-check occupancy of room {}: {}", room, e);
            }
        }
    }
}
