//! Client execution logic with reconnection support.

use std::time::Duration;

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;
use tsunagi_server::infrastructure::dto::http::GenerateRoomResponse;

use super::{
    domain::{ReconnectBudget, generate_url, websocket_url},
    error::ClientError,
    session::{connect, run_client_session},
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
// shorter than the relay's grace period so a dropped room survives the gap
const RECONNECT_INTERVAL: Duration = Duration::from_secs(1);

/// Ask the relay for a new room
async fn generate_room(server: &str) -> Result<String, ClientError> {
    let url = generate_url(server)?;
    let response = reqwest::get(&url)
        .await
        .map_err(|e| ClientError::RoomUnavailable(e.to_string()))?;
    if !response.status().is_success() {
        return Err(ClientError::RoomUnavailable(format!(
            "server answered {}",
            response.status()
        )));
    }
    let body: GenerateRoomResponse = response
        .json()
        .await
        .map_err(|e| ClientError::RoomUnavailable(e.to_string()))?;
    Ok(body.code)
}

/// Read lines on a blocking thread and forward them to the session
fn spawn_readline(name: &str) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();
    let prompt = format!("{}> ", name);

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}

/// Run the terminal client with reconnection logic
///
/// Creates a room first when `room` is `None`.
pub async fn run_client(
    server: String,
    room: Option<String>,
    name: String,
) -> Result<(), ClientError> {
    let room = match room {
        Some(room) => room,
        None => {
            let code = generate_room(&server).await?;
            println!("Created room {}. Share this code with your peer.", code);
            code
        }
    };
    let url = websocket_url(&server, &room, &name)?;
    let mut input_rx = spawn_readline(&name);
    let mut budget = ReconnectBudget::new(MAX_RECONNECT_ATTEMPTS);

    loop {
        tracing::info!(
            "Joining room {} as '{}' (attempt {}/{})",
            room,
            name,
            budget.attempt(),
            budget.max_attempts()
        );

        let result = match connect(&url).await {
            Ok(ws_stream) => {
                budget.connected();
                run_client_session(ws_stream, &room, &name, &mut input_rx).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) => {
                if !budget.record_failure(&e) {
                    return Err(e);
                }

                tracing::warn!("Connection lost: {}", e);
                tracing::info!(
                    "Reconnecting in {:?}... (attempt {}/{})",
                    RECONNECT_INTERVAL,
                    budget.attempt(),
                    budget.max_attempts()
                );
                tokio::time::sleep(RECONNECT_INTERVAL).await;
            }
        }
    }
}
