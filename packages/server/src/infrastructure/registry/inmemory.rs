//! インメモリ Connection Registry 実装
//!
//! ## 責務
//!
//! - 接続ごとの `ConnectionHandle`（`UnboundedSender`）を管理
//! - 接続 ID の発行と、メタデータからハンドルへの解決
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! このレジストリは生成された sender を受け取り、接続 ID をキーに保持するだけです。
//! ロックはマップ操作の間だけ保持し、送信は解決したハンドルのクローンに対して
//! ロックの外で行われます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionHandle, ConnectionId, ConnectionMetadata, ConnectionRegistry, InstanceId, Resolution,
};

/// インメモリ Connection Registry 実装
///
/// ## 使用例
///
/// ```ignore
/// let registry = InMemoryConnectionRegistry::new(InstanceId::generate());
///
/// let (tx, rx) = mpsc::unbounded_channel();
/// let metadata = registry.register(tx).await;
/// ```
pub struct InMemoryConnectionRegistry {
    instance_id: InstanceId,
    /// Key: ConnectionId, Value: ConnectionHandle
    connections: Mutex<HashMap<ConnectionId, ConnectionHandle>>,
}

impl InMemoryConnectionRegistry {
    /// 新しい InMemoryConnectionRegistry を作成
    pub fn new(instance_id: InstanceId) -> Self {
        Self {
            instance_id,
            connections: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    async fn register(&self, handle: ConnectionHandle) -> ConnectionMetadata {
        let connection_id = ConnectionId::generate();
        let mut connections = self.connections.lock().await;
        connections.insert(connection_id, handle);
        tracing::debug!("Connection '{}' registered", connection_id);
        ConnectionMetadata::new(self.instance_id, connection_id)
    }

    async fn unregister(&self, connection_id: &ConnectionId) -> bool {
        let mut connections = self.connections.lock().await;
        let removed = connections.remove(connection_id).is_some();
        if removed {
            tracing::debug!("Connection '{}' unregistered", connection_id);
        }
        removed
    }

    async fn resolve(&self, metadata: &ConnectionMetadata) -> Resolution {
        if !metadata.is_owned_by(&self.instance_id) {
            return Resolution::Remote(metadata.instance_id);
        }
        let connections = self.connections.lock().await;
        match connections.get(&metadata.connection_id) {
            Some(handle) => Resolution::Local(handle.clone()),
            None => Resolution::Unknown,
        }
    }

    async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }
}
