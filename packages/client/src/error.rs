//! Error types for the terminal client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The relay answered the join with an error notification
    #[error("Rejected by server: {0}")]
    Rejected(String),

    /// A room code could not be obtained
    #[error("Failed to create room: {0}")]
    RoomUnavailable(String),

    #[error("Invalid server URL: {0}")]
    InvalidServerUrl(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
