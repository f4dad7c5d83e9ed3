//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::InstanceId,
    usecase::{
        ConnectParticipantUseCase, CreateRoomUseCase, DisconnectParticipantUseCase,
        GetRoomStateUseCase, SendMessageUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// このリレーインスタンスの ID
    pub instance_id: InstanceId,
    /// CreateRoomUseCase（ルーム作成のユースケース）
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    /// ConnectParticipantUseCase（入室のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（退室のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SendMessageUseCase（ブロードキャストのユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// GetRoomStateUseCase（ルーム状態取得のユースケース）
    pub get_room_state_usecase: Arc<GetRoomStateUseCase>,
}
