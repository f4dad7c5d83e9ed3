//! UseCase layer
//!
//! ルームの作成・入室・ブロードキャスト・退室といったアプリケーションの操作を実装します。
//! 各 UseCase は Presence Store と Connection Registry の trait にのみ依存します。

mod connect_participant;
mod create_room;
mod disconnect_participant;
mod error;
mod eviction;
mod get_room_state;
mod send_message;

pub use connect_participant::ConnectParticipantUseCase;
pub use create_room::CreateRoomUseCase;
pub use disconnect_participant::{DisconnectParticipantUseCase, TeardownOutcome};
pub use error::{BroadcastError, BroadcastFault, ConnectError, CreateRoomError, DisconnectError};
pub use eviction::RoomEvictionScheduler;
pub use get_room_state::{GetRoomStateUseCase, RoomState};
pub use send_message::SendMessageUseCase;
