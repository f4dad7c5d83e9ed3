//! UseCase: メッセージのブロードキャスト
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 送信者以外の全メンバーへのメッセージ配信と、最初の失敗での打ち切り
//!
//! ### なぜこのテストが必要か
//! - 送信者自身にメッセージが返らないことを保証
//! - 死んだ接続を持つメンバーを特定し、呼び出し側がそのメンバーを退室させられるようにする
//!
//! ### どのような状況を想定しているか
//! - 正常系：2 名・3 名のルームでの送信、送信者のみのルーム
//! - 異常系：ハンドルが見つからない・他インスタンスの接続・書き込み失敗・ストア障害
//! - エッジケース：失敗したメンバーより後のメンバーには配信されない

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, ParticipantName, PresenceStore, Resolution, RoomCode};

use super::error::{BroadcastError, BroadcastFault};

/// メッセージ送信のユースケース（Broadcast Engine）
pub struct SendMessageUseCase {
    /// Presence Store（共有ストアの抽象化）
    store: Arc<dyn PresenceStore>,
    /// Connection Registry（ライブな接続ハンドルの管理）
    registry: Arc<dyn ConnectionRegistry>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(store: Arc<dyn PresenceStore>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// ブロードキャストを実行
    ///
    /// メンバーは名前順に処理し、最初に失敗したメンバーで処理を打ち切る。
    ///
    /// # Arguments
    ///
    /// * `room` - 送信先のルーム
    /// * `sender` - 送信者（配信対象から除外される）
    /// * `payload` - 送信するメッセージ（シリアライズ済み）
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - 配信したメンバー数
    /// * `Err(BroadcastFault)` - 失敗したメンバーとその理由
    pub async fn execute(
        &self,
        room: &RoomCode,
        sender: &ParticipantName,
        payload: &str,
    ) -> Result<usize, BroadcastFault> {
        // 1. メンバー一覧を取得
        let mut members = self
            .store
            .member_names(room)
            .await
            .map_err(BroadcastFault::store)?;
        members.sort();

        // 2. 送信者以外に配信
        let mut delivered = 0;
        for member in members.into_iter().filter(|m| m != sender) {
            let metadata = match self.store.member_metadata(room, &member).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    return Err(BroadcastFault::member(member, None, e.into()));
                }
            };

            match self.registry.resolve(&metadata).await {
                Resolution::Local(handle) => {
                    if handle.send(payload.to_string()).is_err() {
                        return Err(BroadcastFault::member(
                            member.clone(),
                            Some(metadata),
                            BroadcastError::WriteFailed(member),
                        ));
                    }
                    tracing::debug!(
                        "Relayed message from '{}' to '{}' in room {}",
                        sender,
                        member,
                        room
                    );
                    delivered += 1;
                }
                Resolution::Remote(instance_id) => {
                    return Err(BroadcastFault::member(
                        member.clone(),
                        Some(metadata),
                        BroadcastError::RemoteConnection {
                            member,
                            instance_id,
                        },
                    ));
                }
                Resolution::Unknown => {
                    return Err(BroadcastFault::member(
                        member.clone(),
                        Some(metadata),
                        BroadcastError::HandleNotFound(member),
                    ));
                }
            }
        }

        Ok(delivered)
    }
}
