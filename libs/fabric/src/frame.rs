//! Length-prefix framing
//!
//! Every frame is a 4-byte big-endian length followed by that many bytes.
//! Reads accumulate in a [`FrameBuffer`] until a whole frame is present, so
//! it does not matter how the peer's writes were split across TCP segments.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ConfigError, Error, Result};

pub const HEADER_LEN: usize = 4;

/// Default cap on a single frame's payload (1 MiB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Hard ceiling any configured cap must stay under (100 MiB)
pub const MAX_FRAME_SIZE_LIMIT: usize = 100 * 1024 * 1024;

/// Check a configured cap against [`MAX_FRAME_SIZE_LIMIT`]
pub fn check_max_frame_size(max_frame_size: usize) -> std::result::Result<(), ConfigError> {
    if max_frame_size == 0 {
        return Err(ConfigError::ZeroFrameSize);
    }
    if max_frame_size > MAX_FRAME_SIZE_LIMIT {
        return Err(ConfigError::FrameSizeTooLarge(max_frame_size));
    }
    Ok(())
}

/// Prefix `payload` with its length
pub fn encode(payload: &[u8], max_frame_size: usize) -> Result<Bytes> {
    if payload.len() > max_frame_size {
        return Err(Error::FrameTooLarge {
            size: payload.len(),
            max: max_frame_size,
            outbound: true,
        });
    }
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// Growable read buffer that yields complete frames
#[derive(Debug)]
pub struct FrameBuffer {
    buf: BytesMut,
    max_frame_size: usize,
}

impl FrameBuffer {
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
            max_frame_size,
        }
    }

    /// The buffer socket reads append into
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Bytes received but not yet returned as a frame
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Split the next complete frame off the front of the buffer
    ///
    /// Returns `Ok(None)` while the frame is still incomplete. Fails as soon
    /// as the header announces more than the configured maximum, without
    /// waiting for the body.
    pub fn try_frame(&mut self) -> Result<Option<Bytes>> {
        if self.buf.len() < HEADER_LEN {
            return Ok(None);
        }

        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&self.buf[..HEADER_LEN]);
        let len = u32::from_be_bytes(header) as usize;

        if len > self.max_frame_size {
            return Err(Error::FrameTooLarge {
                size: len,
                max: self.max_frame_size,
                outbound: false,
            });
        }

        let total = HEADER_LEN + len;
        if self.buf.len() < total {
            self.buf.reserve(total - self.buf.len());
            return Ok(None);
        }

        self.buf.advance(HEADER_LEN);
        Ok(Some(self.buf.split_to(len).freeze()))
    }
}
