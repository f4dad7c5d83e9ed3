//! Connection Registry trait 定義
//!
//! 接続 ID からライブな接続ハンドルへの対応表のインターフェース。
//! レジストリはインスタンスごとに一つ生成され、必要なコンポーネントへ
//! コンストラクタ経由で明示的に渡されます（グローバル状態は持たない）。

use async_trait::async_trait;

use super::{
    entity::{ConnectionHandle, ConnectionMetadata, Resolution},
    value_object::{ConnectionId, InstanceId},
};

/// Connection Registry trait
///
/// ## 責務
///
/// - 接続ハンドルの登録と接続 ID の発行
/// - 接続ハンドルの登録解除（冪等）
/// - 接続メタデータからハンドルへの解決（Local / Remote / Unknown）
///
/// ロックはマップ操作の間だけ保持し、ネットワーク I/O の間は保持しないこと。
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// このレジストリを所有するインスタンスの ID
    fn instance_id(&self) -> InstanceId;

    /// ハンドルを登録し、新しい接続 ID を含むメタデータを返す
    async fn register(&self, handle: ConnectionHandle) -> ConnectionMetadata;

    /// ハンドルの登録を解除（存在しなければ何もしない）
    ///
    /// 登録が存在して削除した場合に `true` を返す。
    async fn unregister(&self, connection_id: &ConnectionId) -> bool;

    /// メタデータをライブなハンドルに解決
    async fn resolve(&self, metadata: &ConnectionMetadata) -> Resolution;

    /// 登録中の接続数
    async fn connection_count(&self) -> usize;
}
