//! Room code factory

use rand::Rng;

use super::value_object::{ROOM_CODE_LENGTH, RoomCode};

/// Alphabet room codes are drawn from (26 letters + 10 digits)
pub const ROOM_CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Source of candidate room codes
///
/// 生成されたコードの一意性は保証しない。重複回避は CreateRoomUseCase が
/// Presence Store に問い合わせて行う。
pub trait RoomCodeGenerator: Send + Sync {
    fn generate(&self) -> RoomCode;
}

/// Uniform random generator backed by the thread-local RNG
///
/// Not cryptographically secure; codes only need to be practically
/// collision-resistant over the active-room population.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomRoomCodeGenerator;

impl RoomCodeGenerator for RandomRoomCodeGenerator {
    fn generate(&self) -> RoomCode {
        let mut rng = rand::thread_rng();
        let code: String = (0..ROOM_CODE_LENGTH)
            .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect();
        // every character comes from the alphabet, so validation cannot fail
        RoomCode::new(code).unwrap_or_else(|e| unreachable!("{e}"))
    }
}
