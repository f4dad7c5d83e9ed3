//! Infrastructure layer
//!
//! ドメイン層が定義する trait の具体的な実装と、ワイヤーフォーマット（DTO）。

pub mod dto;
pub mod presence;
pub mod registry;
