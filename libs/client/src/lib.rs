//! Presence Client - typed API for the terminal front-end
//!
//! # Example
//!
//! ```no_run
//! use presence_client::{Client, UserStatus};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::connect("127.0.0.1:7878").await?;
//! client.add_user("n1", "Ada").await?;
//! client.update_status("n1", UserStatus::Online).await?;
//!
//! for user in client.get_users().await? {
//!     println!("{} ({})", user.display_name, user.node_id);
//! }
//! client.close().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;

// Re-exports for convenience
pub use client::Client;
pub use config::ClientConfig;
pub use presence_core::{NodeId, SenderRef, User, UserStatus};
pub use presence_fabric::{ConfigError, Error, Result};
