//! Domain layer
//!
//! ルーム・参加者・接続メタデータのドメインモデルと、
//! ドメイン層が必要とする外部コンポーネントのインターフェース（trait）を定義します。

pub mod entity;
pub mod error;
pub mod factory;
pub mod presence;
pub mod registry;
pub mod value_object;

pub use entity::{ConnectionHandle, ConnectionMetadata, ROOM_CAPACITY, Resolution};
pub use error::{AdmissionError, PresenceError, ValueObjectError};
pub use factory::{ROOM_CODE_ALPHABET, RandomRoomCodeGenerator, RoomCodeGenerator};
pub use presence::PresenceStore;
pub use registry::ConnectionRegistry;
pub use value_object::{ConnectionId, InstanceId, ParticipantName, ROOM_CODE_LENGTH, RoomCode};

#[cfg(test)]
pub use presence::MockPresenceStore;
