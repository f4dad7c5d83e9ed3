//! Data Transfer Objects
//!
//! - `http`: HTTP API のレスポンス
//! - `websocket`: WebSocket 上でリレー自身が送るメッセージ

pub mod http;
pub mod websocket;
