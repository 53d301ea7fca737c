//! Shared types for the gemini-chat session client.

mod base64_serde;

pub mod config;
pub mod content;
pub mod enums;
pub mod grounding;
pub mod models;
pub mod response;
pub mod tool;
