//! WebSocket session handling.
//!
//! 1 接続ごとのセッションの流れ：
//!
//! ```text
//! Connecting ──入室──▶ Admitted ──▶ Active ──読み込み失敗──▶ Closed
//!                                    │  ▲
//!                                    └──┘ 受信メッセージごとにブロードキャスト
//! ```
//!
//! セッションを終わらせるのは読み込み側の終了だけです。ブロードキャストの失敗は
//! 失敗したメンバーの退室処理を起動するだけで、自分のセッションは続きます。

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionHandle, ConnectionMetadata, ParticipantName, RoomCode},
    infrastructure::dto::websocket::ErrorMessage,
    ui::state::AppState,
};

/// Query parameters for joining a room
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    #[serde(default)]
    pub name: String,
}

/// Upgrade the connection and run the session for `code`
///
/// 入室の可否はアップグレード後に判定し、拒否する場合はエラー通知を送ってから閉じる。
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, code, query.name))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Write an error notification and close the socket
async fn reject(mut sender: SplitSink<WebSocket, Message>, error: String) {
    let notification = ErrorMessage::new(error).to_json();
    if let Err(e) = sender.send(Message::Text(notification.into())).await {
        tracing::debug!("Failed to deliver rejection: {}", e);
        return;
    }
    let _ = sender.send(Message::Close(None)).await;
}

fn parse_target(code: String, name: String) -> Result<(RoomCode, ParticipantName), String> {
    // malformed codes can never name an active room
    let room = RoomCode::new(code.clone()).map_err(|e| {
        tracing::warn!("Rejected connection: {}", e);
        format!("room {} not found", code)
    })?;
    let name = ParticipantName::new(name).map_err(|e| {
        tracing::warn!("Rejected connection to room {}: {}", room, e);
        e.to_string()
    })?;
    Ok((room, name))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, code: String, name: String) {
    let (sender, receiver) = socket.split();

    // Connecting
    let (room, name) = match parse_target(code, name) {
        Ok(target) => target,
        Err(error) => {
            reject(sender, error).await;
            return;
        }
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let metadata = match state
        .connect_participant_usecase
        .execute(&room, &name, tx.clone())
        .await
    {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!("'{}' could not join room {}: {}", name, room, e);
            reject(sender, e.user_message()).await;
            return;
        }
    };

    // Admitted → Active
    let send_task = pusher_loop(rx, sender);
    read_loop(receiver, &state, &room, &name, &tx).await;

    // Closed
    send_task.abort();
    spawn_teardown(state, room, name, Some(metadata));
}

async fn read_loop(
    mut receiver: SplitStream<WebSocket>,
    state: &Arc<AppState>,
    room: &RoomCode,
    name: &ParticipantName,
    own_handle: &ConnectionHandle,
) {
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::info!("Connection of '{}' in room {} failed: {}", name, room, e);
                return;
            }
        };

        match msg {
            Message::Text(text) => relay(state, room, name, own_handle, text.as_str()).await,
            Message::Binary(_) => {
                tracing::debug!("Ignoring binary frame from '{}'", name);
            }
            Message::Close(_) => {
                tracing::debug!("'{}' closed the connection to room {}", name, room);
                return;
            }
            _ => {}
        }
    }
}

/// Queue an error notification on a participant's own handle
///
/// Returns `false` when the handle's socket is already gone.
fn notify(handle: &ConnectionHandle, error: &str) -> bool {
    let notification = ErrorMessage::new(error).to_json();
    match handle.send(notification) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("Failed to deliver error notification: {}", e);
            false
        }
    }
}

/// Broadcast one inbound payload to the rest of the room
async fn relay(
    state: &Arc<AppState>,
    room: &RoomCode,
    name: &ParticipantName,
    own_handle: &ConnectionHandle,
    text: &str,
) {
    let is_object = serde_json::from_str::<serde_json::Value>(text)
        .map(|value| value.is_object())
        .unwrap_or(false);
    if !is_object {
        tracing::warn!("Dropping non-object payload from '{}' in room {}", name, room);
        notify(own_handle, "message must be a JSON object");
        return;
    }

    match state.send_message_usecase.execute(room, name, text).await {
        Ok(delivered) => {
            tracing::debug!("Message from '{}' delivered to {} member(s)", name, delivered);
        }
        Err(fault) => {
            tracing::warn!("Broadcast in room {} failed: {}", room, fault);
            if let Some(member) = fault.faulty_member {
                spawn_teardown(state.clone(), room.clone(), member, fault.faulty_connection);
            }
        }
    }
}

/// Run the teardown of `name` detached from the session
fn spawn_teardown(
    state: Arc<AppState>,
    room: RoomCode,
    name: ParticipantName,
    expected: Option<ConnectionMetadata>,
) {
    tokio::spawn(async move {
        match state
            .disconnect_participant_usecase
            .execute(&room, &name, expected)
            .await
        {
            Ok(outcome) => {
                tracing::debug!("Teardown of '{}' in room {}: {:?}", name, room, outcome);
            }
            Err(e) => {
                tracing::debug!("Teardown of '{}' in room {} ended early: {}", name, room, e);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_writes_error_envelope() {
        // テスト項目: エラー通知が自分のハンドルに {"type":"error",...} として積まれる
        // given (前提条件):
        let (tx, mut rx) = mpsc::unbounded_channel();

        // when (操作):
        let delivered = notify(&tx, "message must be a JSON object");

        // then (期待する結果):
        assert!(delivered);
        let json: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "error", "error": "message must be a JSON object"})
        );
    }

    #[test]
    fn test_notify_reports_closed_handle() {
        // テスト項目: 受信側がすでに閉じている場合は false を返し、パニックしない
        // given (前提条件):
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        // when (操作):
        let delivered = notify(&tx, "message must be a JSON object");

        // then (期待する結果):
        assert!(!delivered);
    }

    #[test]
    fn test_parse_target_reports_malformed_code_as_not_found() {
        // テスト項目: 形式の不正なルームコードは room not found として拒否される
        // given (前提条件):
        let code = "abc".to_string();

        // when (操作):
        let result = parse_target(code, "alice".to_string());

        // then (期待する結果):
        assert_eq!(result, Err("room abc not found".to_string()));
    }
}
