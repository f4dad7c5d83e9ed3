//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    domain::InstanceId,
    usecase::{
        ConnectParticipantUseCase, CreateRoomUseCase, DisconnectParticipantUseCase,
        GetRoomStateUseCase, SendMessageUseCase,
    },
};

use super::{
    handler::{generate_room, get_room_state, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     instance_id,
///     create_room_usecase,
///     connect_participant_usecase,
///     disconnect_participant_usecase,
///     send_message_usecase,
///     get_room_state_usecase,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    instance_id: InstanceId,
    create_room_usecase: Arc<CreateRoomUseCase>,
    connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    send_message_usecase: Arc<SendMessageUseCase>,
    get_room_state_usecase: Arc<GetRoomStateUseCase>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        instance_id: InstanceId,
        create_room_usecase: Arc<CreateRoomUseCase>,
        connect_participant_usecase: Arc<ConnectParticipantUseCase>,
        disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
        send_message_usecase: Arc<SendMessageUseCase>,
        get_room_state_usecase: Arc<GetRoomStateUseCase>,
    ) -> Self {
        Self {
            instance_id,
            create_room_usecase,
            connect_participant_usecase,
            disconnect_participant_usecase,
            send_message_usecase,
            get_room_state_usecase,
        }
    }

    /// Build the router with every endpoint of the relay
    pub fn router(&self) -> Router {
        let app_state = Arc::new(AppState {
            instance_id: self.instance_id,
            create_room_usecase: self.create_room_usecase.clone(),
            connect_participant_usecase: self.connect_participant_usecase.clone(),
            disconnect_participant_usecase: self.disconnect_participant_usecase.clone(),
            send_message_usecase: self.send_message_usecase.clone(),
            get_room_state_usecase: self.get_room_state_usecase.clone(),
        });

        Router::new()
            // Room エンドポイント
            .route("/room/generate", get(generate_room))
            .route("/room/connect/{code}", get(websocket_handler))
            // HTTP API エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms/{code}", get(get_room_state))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the relay server until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Relay instance {} listening on {}",
            self.instance_id,
            listener.local_addr()?
        );
        tracing::info!("Create a room: http://{}/room/generate", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
