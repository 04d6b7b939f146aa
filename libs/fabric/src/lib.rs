//! Presence Fabric - framing, transport and request correlation
//!
//! Carries presence-core envelopes over a length-prefixed TCP connection and
//! serializes request/response exchanges on it.
//!
//! # Example
//!
//! ```no_run
//! use presence_core::GetUsers;
//! use presence_fabric::{Channel, Correlator, TcpTransport};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = TcpTransport::builder()
//!     .address("127.0.0.1:7878")
//!     .receive_timeout(Duration::from_secs(5))
//!     .connect()
//!     .await?;
//!
//! let correlator = Correlator::new(Channel::from_transport(transport));
//! let users = correlator.exchange(&GetUsers {}).await?;
//! println!("{} users online", users.users.len());
//! correlator.close().await;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod correlator;
pub mod error;
pub mod frame;
pub mod transport;

// Re-exports for convenience
pub use channel::Channel;
pub use correlator::Correlator;
pub use error::{ConfigError, Error, Result};
pub use transport::{TcpTransport, TcpTransportBuilder, TcpTransportListener, Transport};
