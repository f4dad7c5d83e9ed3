//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use reqwest::Url;

use crate::error::ClientError;

/// Check if the client should exit immediately based on the error type.
///
/// Rejections (room full, unknown room, name taken) will not change on retry.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::Rejected(_) | ClientError::RoomUnavailable(_) | ClientError::InvalidServerUrl(_)
    )
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}

/// Consecutive failed attempts, counted against `max_attempts`
///
/// A session that connects starts the count over, so drops spread over a long
/// session never use up the budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectBudget {
    failures: u32,
    max_attempts: u32,
}

impl ReconnectBudget {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            failures: 0,
            max_attempts,
        }
    }

    /// 1-indexed number of the attempt about to be made
    pub fn attempt(&self) -> u32 {
        self.failures + 1
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// A connection was established
    pub fn connected(&mut self) {
        self.failures = 0;
    }

    /// Record a failed or ended session; returns whether to try again
    pub fn record_failure(&mut self, error: &ClientError) -> bool {
        self.failures += 1;
        should_attempt_reconnect(error, self.failures, self.max_attempts)
    }
}

fn parse_server(server: &str) -> Result<Url, ClientError> {
    Url::parse(server).map_err(|e| ClientError::InvalidServerUrl(format!("{}: {}", server, e)))
}

/// URL of the room-generation endpoint
pub fn generate_url(server: &str) -> Result<String, ClientError> {
    let url = parse_server(server)?
        .join("/room/generate")
        .map_err(|e| ClientError::InvalidServerUrl(e.to_string()))?;
    Ok(url.to_string())
}

/// WebSocket URL joining `room` as `name`
///
/// `http` maps to `ws` and `https` to `wss`.
pub fn websocket_url(server: &str, room: &str, name: &str) -> Result<String, ClientError> {
    let mut url = parse_server(server)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ClientError::InvalidServerUrl(format!(
                "unsupported scheme '{}'",
                other
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::InvalidServerUrl(server.to_string()))?;
    url.set_path(&format!("/room/connect/{}", room));
    url.query_pairs_mut().clear().append_pair("name", name);
    Ok(url.to_string())
}
