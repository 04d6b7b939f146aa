use std::time::Duration;

use presence_fabric::frame::{self, DEFAULT_MAX_FRAME_SIZE};
use presence_fabric::{ConfigError, TcpTransportBuilder};
use serde::{Deserialize, Serialize};

/// Connection settings for [`Client`](crate::Client)
///
/// Deserializable so a front-end can embed it in its own config file; every
/// field falls back to its default. A timeout of `0` disables that deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub connect_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub max_frame_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            write_timeout_ms: 5_000,
            read_timeout_ms: 10_000,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        millis(self.connect_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        frame::check_max_frame_size(self.max_frame_size)
    }

    /// Transport builder for `addr` carrying these settings
    pub fn transport(&self, addr: impl Into<String>) -> TcpTransportBuilder {
        let mut builder = TcpTransportBuilder::new()
            .address(addr)
            .max_frame_size(self.max_frame_size);
        if let Some(timeout) = self.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.write_timeout() {
            builder = builder.send_timeout(timeout);
        }
        if let Some(timeout) = self.read_timeout() {
            builder = builder.receive_timeout(timeout);
        }
        builder
    }
}
