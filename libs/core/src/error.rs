use thiserror::Error;

/// Errors raised while turning catalog messages into envelopes and back
///
/// None of these touch the connection; a caller hitting one can keep using it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Encode error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Payload for '{tag}' did not decode: {source}")]
    PayloadDecode {
        tag: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Type mismatch: expected '{expected}', got '{found}'")]
    TypeMismatch { expected: String, found: String },

    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("Node id must not be empty")]
    EmptyNodeId,

    #[error("Invalid message sender: {0}")]
    InvalidSender(&'static str),

    #[error("Invalid user status: {0}")]
    InvalidStatus(String),
}

impl Error {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
