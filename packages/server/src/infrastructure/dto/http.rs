//! HTTP API response DTOs

use serde::{Deserialize, Serialize};

/// Response of `GET /room/generate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRoomResponse {
    pub code: String,
}

/// Response of `GET /api/rooms/{code}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStateDto {
    pub code: String,
    pub active: bool,
    pub occupancy: usize,
    /// Sorted member names
    pub members: Vec<String>,
}

/// Response of `GET /api/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub instance_id: String,
}

/// Error body for HTTP failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub error: String,
}
