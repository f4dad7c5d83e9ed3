//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};
use tsunagi_shared::time::now_millis;

use crate::{
    error::ClientError,
    message::{ChatMessage, Inbound},
};

use super::{formatter::MessageFormatter, ui::redisplay_prompt};

pub type RelaySocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open the WebSocket to the relay (`ws://` or `wss://`)
pub async fn connect(url: &str) -> Result<RelaySocket, ClientError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    tracing::info!("Connected to relay");
    Ok(ws_stream)
}

/// Run one WebSocket session on an open socket
///
/// Returns `Ok(())` when the input side ends (Ctrl+C / Ctrl+D) and an error
/// when the relay rejects the join or the connection drops.
pub async fn run_client_session(
    ws_stream: RelaySocket,
    room: &str,
    name: &str,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    print!("{}", MessageFormatter::format_entering(room, name));
    redisplay_prompt(name);

    // the relay rejects a join with an error notification followed by a close
    let mut last_error: Option<String> = None;

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            inbound = read.next() => {
                let message = match inbound {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => return Err(ClientError::ConnectionError(e.to_string())),
                    None => return Err(closed(last_error)),
                };

                match message {
                    Message::Text(text) => match Inbound::parse(text.as_str()) {
                        Inbound::Error(error) => {
                            print!("{}", MessageFormatter::format_error(&error.error));
                            last_error = Some(error.error);
                        }
                        Inbound::Chat(chat) => {
                            print!(
                                "{}",
                                MessageFormatter::format_chat_message(
                                    &chat.from,
                                    &chat.content,
                                    chat.sent_at
                                )
                            );
                        }
                        Inbound::Other(raw) => {
                            print!("{}", MessageFormatter::format_raw_message(&raw));
                        }
                    },
                    Message::Binary(data) => {
                        print!("{}", MessageFormatter::format_binary_message(data.len()));
                    }
                    Message::Close(_) => {
                        tracing::info!("Server closed the connection");
                        return Err(closed(last_error));
                    }
                    _ => continue,
                }
                redisplay_prompt(name);
            }
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // input closed by the user
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                };

                let message = ChatMessage::new(name, line, now_millis());
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to serialize message: {}", e);
                        continue;
                    }
                };

                if let Err(e) = write.send(Message::Text(json.into())).await {
                    return Err(ClientError::ConnectionError(e.to_string()));
                }

                print!("\n{}", MessageFormatter::format_sent_confirmation(message.sent_at));
                redisplay_prompt(name);
            }
        }
    }
}

fn closed(last_error: Option<String>) -> ClientError {
    match last_error {
        Some(error) => ClientError::Rejected(error),
        None => ClientError::ConnectionError("Connection closed".to_string()),
    }
}
