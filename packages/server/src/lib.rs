//! Tsunagi relay server library.
//!
//! Ephemeral, room-scoped realtime relay: participants join a two-person room
//! identified by a generated code and every message one participant sends is
//! fanned out to the other. Room presence lives in a shared Presence Store
//! while live socket handles stay in a process-local Connection Registry.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
