//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::RoomCode,
    infrastructure::dto::http::{ErrorResponseDto, GenerateRoomResponse, HealthDto, RoomStateDto},
    ui::state::AppState,
};

type ErrorResponse = (StatusCode, Json<ErrorResponseDto>);

fn error_response(status: StatusCode, error: impl Into<String>) -> ErrorResponse {
    (
        status,
        Json(ErrorResponseDto {
            error: error.into(),
        }),
    )
}

/// Create a room with a fresh code
pub async fn generate_room(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GenerateRoomResponse>, ErrorResponse> {
    match state.create_room_usecase.execute().await {
        Ok(code) => Ok(Json(GenerateRoomResponse {
            code: code.into_string(),
        })),
        Err(e) => {
            tracing::error!("Failed to generate room: {}", e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to create room",
            ))
        }
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
        instance_id: state.instance_id.to_string(),
    })
}

/// Get the presence state of one room
pub async fn get_room_state(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<RoomStateDto>, ErrorResponse> {
    let code =
        RoomCode::new(code).map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;

    match state.get_room_state_usecase.execute(code).await {
        Ok(room) => {
            // Domain Model から DTO への変換
            Ok(Json(RoomStateDto {
                code: room.code.into_string(),
                active: room.active,
                occupancy: room.occupancy,
                members: room.members.into_iter().map(|m| m.into_string()).collect(),
            }))
        }
        Err(e) => {
            tracing::error!("Failed to read room state: {}", e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "presence store unavailable",
            ))
        }
    }
}
