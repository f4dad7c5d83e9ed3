//! Terminal participant for a Tsunagi room.

pub mod domain;
pub mod error;
mod formatter;
pub mod message;
mod runner;
mod session;
mod ui;

pub use runner::run_client;
