//! Utilities shared by the Tsunagi server and client binaries.

pub mod logger;
pub mod time;
