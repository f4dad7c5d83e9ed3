//! Presence Store 実装
//!
//! - `inmemory`: 単一インスタンス向けのインメモリ実装（デフォルト・テスト用）
//! - `redis`: 複数インスタンスで共有できる Redis 実装

pub mod inmemory;
pub mod redis;

pub use self::inmemory::InMemoryPresenceStore;
pub use self::redis::RedisPresenceStore;
