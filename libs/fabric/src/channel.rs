use presence_core::{Envelope, Message};
use tracing::trace;

use crate::error::Result;
use crate::transport::{TcpTransport, Transport};

/// Envelopes over a framed transport
///
/// One frame carries exactly one JSON envelope.
pub struct Channel {
    transport: Box<dyn Transport>,
}

impl Channel {
    /// Create a channel from an existing transport
    pub fn from_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    /// Open a TCP channel with no timeouts
    pub async fn tcp(addr: impl Into<String>) -> Result<Self> {
        let transport = TcpTransport::connect(addr).await?;
        Ok(Self::from_transport(transport))
    }

    /// Send a prepared envelope
    pub async fn send_envelope(&mut self, envelope: &Envelope) -> Result<()> {
        let bytes = envelope.to_bytes()?;
        trace!(tag = %envelope.tag, bytes = bytes.len(), "channel send");
        self.transport.send(&bytes).await
    }

    /// Send a catalog message
    pub async fn send<M: Message>(&mut self, message: &M) -> Result<()> {
        let envelope = Envelope::new(message)?;
        self.send_envelope(&envelope).await
    }

    /// Receive the next envelope without looking at its tag
    pub async fn receive_envelope(&mut self) -> Result<Envelope> {
        let bytes = self.transport.receive().await?;
        let envelope = Envelope::from_bytes(&bytes)?;
        trace!(tag = %envelope.tag, bytes = bytes.len(), "channel receive");
        Ok(envelope)
    }

    /// Receive the next envelope and decode it as `M`
    pub async fn receive<M: Message>(&mut self) -> Result<M> {
        let envelope = self.receive_envelope().await?;
        Ok(envelope.open()?)
    }

    pub fn is_usable(&self) -> bool {
        self.transport.is_usable()
    }

    /// Close the channel; safe to call more than once
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }
}
