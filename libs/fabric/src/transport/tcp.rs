use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::frame::{self, FrameBuffer, DEFAULT_MAX_FRAME_SIZE};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    /// The byte stream may be out of step with the framing
    Broken,
    Closed,
}

/// TCP transport with length-prefix framing
///
/// Messages are sent with a 4-byte big-endian length prefix. Incoming bytes
/// accumulate in a growable buffer until a whole frame is present.
pub struct TcpTransport {
    stream: TcpStream,
    frames: FrameBuffer,
    max_frame_size: usize,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
    state: State,
}

impl TcpTransport {
    /// Connect to a remote TCP address with no timeouts
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        Self::builder().address(addr).connect().await
    }

    /// Create a builder for configuring the transport
    pub fn builder() -> TcpTransportBuilder {
        TcpTransportBuilder::new()
    }

    /// Create from an existing TcpStream
    pub fn from_stream(stream: TcpStream) -> Self {
        Self::with_settings(stream, DEFAULT_MAX_FRAME_SIZE, None, None)
    }

    fn with_settings(
        stream: TcpStream,
        max_frame_size: usize,
        send_timeout: Option<Duration>,
        receive_timeout: Option<Duration>,
    ) -> Self {
        Self {
            stream,
            frames: FrameBuffer::new(max_frame_size),
            max_frame_size,
            send_timeout,
            receive_timeout,
            state: State::Open,
        }
    }

    /// Get the remote address of this connection
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.stream.peer_addr().map_err(Into::into)
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            State::Broken => Err(Error::Broken),
            State::Closed => Err(Error::ConnectionClosed),
        }
    }

    fn note_failure(&mut self, err: &Error) {
        if self.state == State::Open && !err.connection_usable() {
            warn!(error = %err, "tcp transport marked broken");
            self.state = State::Broken;
        }
    }

    async fn write_frame(stream: &mut TcpStream, frame: &[u8], written: &mut usize) -> Result<()> {
        while *written < frame.len() {
            let n = stream
                .write(&frame[*written..])
                .await
                .map_err(Error::Write)?;
            if n == 0 {
                return Err(Error::Write(io::ErrorKind::WriteZero.into()));
            }
            *written += n;
        }
        stream.flush().await.map_err(Error::Write)
    }

    async fn read_frame(stream: &mut TcpStream, frames: &mut FrameBuffer) -> Result<Bytes> {
        loop {
            if let Some(frame) = frames.try_frame()? {
                return Ok(frame);
            }
            let n = stream
                .read_buf(frames.buffer_mut())
                .await
                .map_err(Error::Read)?;
            if n == 0 {
                return Err(Error::PeerClosed);
            }
            trace!(read = n, pending = frames.pending(), "tcp transport read");
        }
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_open()?;
        // Oversized payloads are refused here, before anything hits the socket.
        let frame = frame::encode(bytes, self.max_frame_size)?;

        let mut written = 0;
        let result = match self.send_timeout {
            Some(timeout) => {
                let outcome = tokio::time::timeout(
                    timeout,
                    Self::write_frame(&mut self.stream, &frame, &mut written),
                )
                .await;
                match outcome {
                    Ok(result) => result,
                    Err(_) => Err(Error::WriteTimeout { timeout, written }),
                }
            }
            None => Self::write_frame(&mut self.stream, &frame, &mut written).await,
        };

        match result {
            Ok(()) => {
                debug!(bytes = frame.len(), "tcp transport sent frame");
                Ok(())
            }
            Err(err) => {
                self.note_failure(&err);
                Err(err)
            }
        }
    }

    async fn receive(&mut self) -> Result<Bytes> {
        self.ensure_open()?;

        let result = match self.receive_timeout {
            Some(timeout) => {
                tokio::time::timeout(timeout, Self::read_frame(&mut self.stream, &mut self.frames))
                    .await
                    .unwrap_or(Err(Error::ReadTimeout(timeout)))
            }
            None => Self::read_frame(&mut self.stream, &mut self.frames).await,
        };

        match result {
            Ok(frame) => {
                debug!(bytes = frame.len(), "tcp transport received frame");
                Ok(frame)
            }
            Err(err) => {
                self.note_failure(&err);
                Err(err)
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.state == State::Closed {
            return Ok(());
        }
        self.state = State::Closed;
        self.frames.clear();

        match self.stream.shutdown().await {
            Ok(()) => Ok(()),
            // The peer got there first.
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn is_usable(&self) -> bool {
        self.state == State::Open
    }
}

/// TCP listener for accepting incoming connections
pub struct TcpTransportListener {
    listener: TcpListener,
    max_frame_size: usize,
}

impl TcpTransportListener {
    /// Bind to a local address
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        })
    }

    /// Cap the frame size of accepted connections
    pub fn max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }

    /// Accept an incoming connection
    pub async fn accept(&self) -> Result<(TcpTransport, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await?;
        debug!(%addr, "tcp listener accepted connection");
        let transport = TcpTransport::with_settings(stream, self.max_frame_size, None, None);
        Ok((transport, addr))
    }

    /// Get the local address this listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Into::into)
    }

    /// Close the listener
    ///
    /// Note: Tokio's TcpListener doesn't have an explicit close,
    /// cleanup happens on drop. This is a no-op for compatibility.
    pub async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl crate::transport::TransportListener for TcpTransportListener {
    type Transport = TcpTransport;

    async fn accept(&self) -> Result<Self::Transport> {
        let (transport, _) = TcpTransportListener::accept(self).await?;
        Ok(transport)
    }

    async fn close(&mut self) -> Result<()> {
        TcpTransportListener::close(self).await
    }
}

/// Builder for configuring TCP transport
#[derive(Debug, Clone)]
pub struct TcpTransportBuilder {
    address: Option<String>,
    connect_timeout: Option<Duration>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
    max_frame_size: usize,
}

impl Default for TcpTransportBuilder {
    fn default() -> Self {
        Self {
            address: None,
            connect_timeout: None,
            send_timeout: None,
            receive_timeout: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl TcpTransportBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address to connect to, as `host:port`
    pub fn address(mut self, addr: impl Into<String>) -> Self {
        self.address = Some(addr.into());
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the send timeout
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Set the receive timeout
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }

    /// Set the largest frame accepted in either direction
    pub fn max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }

    /// Connect with the configured settings
    ///
    /// An out-of-range frame cap fails with [`Error::Config`] before dialing.
    pub async fn connect(self) -> Result<TcpTransport> {
        frame::check_max_frame_size(self.max_frame_size)?;
        let addr = self
            .address
            .ok_or_else(|| Error::custom("Address not set"))?;

        let connect_op = TcpStream::connect(addr.as_str());

        let connected = if let Some(timeout) = self.connect_timeout {
            tokio::time::timeout(timeout, connect_op)
                .await
                .map_err(|_| Error::ConnectTimeout {
                    addr: addr.clone(),
                    timeout,
                })?
        } else {
            connect_op.await
        };

        let stream = connected.map_err(|source| Error::Connect {
            addr: addr.clone(),
            source,
        })?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!(%addr, error = %e, "could not disable nagle");
        }
        debug!(%addr, "tcp transport connected");

        Ok(TcpTransport::with_settings(
            stream,
            self.max_frame_size,
            self.send_timeout,
            self.receive_timeout,
        ))
    }
}
