//! Error definitions for the chat client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("Stream error: {message}")]
    Stream { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
