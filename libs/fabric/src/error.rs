use std::time::Duration;

use thiserror::Error;

/// Settings rejected before any connection is attempted
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_frame_size must be greater than zero")]
    ZeroFrameSize,

    #[error("max_frame_size {0} exceeds the 100 MiB limit")]
    FrameSizeTooLarge(usize),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("Write error: {0}")]
    Write(#[source] std::io::Error),

    #[error("Write timed out after {timeout:?} ({written} bytes written)")]
    WriteTimeout { timeout: Duration, written: usize },

    #[error("Read error: {0}")]
    Read(#[source] std::io::Error),

    #[error("Read timed out after {0:?}")]
    ReadTimeout(Duration),

    #[error("Connection closed by peer")]
    PeerClosed,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Connection is broken and must be reopened")]
    Broken,

    /// `outbound` is set when the frame was refused before it was written
    #[error("Frame too large: {size} bytes (max {max}, outbound: {outbound})")]
    FrameTooLarge {
        size: usize,
        max: usize,
        outbound: bool,
    },

    #[error("Service rejected request: {0}")]
    Remote(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Protocol(#[from] presence_core::Error),

    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Whether the connection that produced this error can carry another request
    ///
    /// Malformed data, service-side rejections and frames refused before
    /// sending leave the stream in sync. Everything at the socket level, and
    /// any timeout after bytes moved, does not.
    pub fn connection_usable(&self) -> bool {
        match self {
            Error::Protocol(_) | Error::Remote(_) | Error::Custom(_) => true,
            Error::WriteTimeout { written, .. } => *written == 0,
            Error::FrameTooLarge { outbound, .. } => *outbound,
            Error::Config(_)
            | Error::Io(_)
            | Error::Connect { .. }
            | Error::ConnectTimeout { .. }
            | Error::Write(_)
            | Error::Read(_)
            | Error::ReadTimeout(_)
            | Error::PeerClosed
            | Error::ConnectionClosed
            | Error::Broken => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::ConnectTimeout { .. } | Error::WriteTimeout { .. } | Error::ReadTimeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
