//! API 层
//!
//! 负责与远端聊天补全服务的交互

pub mod chat;

pub use chat::{ChatApi, ChatClient};
