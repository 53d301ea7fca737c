//! Multi-turn chat sessions for Gemini models.
//!
//! The network call is made by an injected [`RequestDelegate`]; this crate
//! owns the conversation history and decides, turn by turn, what is recorded.

pub mod chats;
pub mod client;
pub mod delegate;
pub mod diagnostics;
pub mod error;
pub mod stream;

#[cfg(test)]
mod test_support;

pub use gemini_chat_types as types;

pub use chats::{ChatInput, ChatSession, Chats};
pub use client::{Client, ClientBuilder, ClientConfig};
pub use delegate::{GenerateContentStreamResult, RequestDelegate, RequestOptions, ResponseStream};
pub use diagnostics::{DiagnosticSink, TracingSink};
pub use error::{Error, Result};
