use bytes::Bytes;

use crate::error::Result;

pub mod tcp;

pub use self::tcp::{TcpTransport, TcpTransportBuilder, TcpTransportListener};

/// Transport trait for sending and receiving whole frames
///
/// Each transport instance represents a single connection.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send one frame
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Receive one complete frame, however the peer's bytes were split
    async fn receive(&mut self) -> Result<Bytes>;

    /// Close the connection; calling it again is a no-op
    async fn close(&mut self) -> Result<()>;

    /// False once the connection is broken or closed
    fn is_usable(&self) -> bool;
}

/// Trait for accepting incoming transport connections
#[async_trait::async_trait]
pub trait TransportListener: Send + Sync {
    type Transport: Transport;

    async fn accept(&self) -> Result<Self::Transport>;

    async fn close(&mut self) -> Result<()>;
}
