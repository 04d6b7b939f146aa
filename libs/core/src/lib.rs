//! Presence Core - protocol data shared by the client and the service
//!
//! Holds the message catalog, the envelope codec and the domain types.
//! Nothing in here performs I/O.
//!
//! # Example
//!
//! ```
//! use presence_core::{envelope, AddUser, Envelope, NodeId};
//!
//! let add = AddUser {
//!     node_id: NodeId::new("n1").unwrap(),
//!     display_name: "Ada".to_string(),
//! };
//! let bytes = envelope::encode(&add).unwrap();
//! let decoded: AddUser = Envelope::from_bytes(&bytes).unwrap().open().unwrap();
//! assert_eq!(decoded, add);
//! ```

pub mod catalog;
pub mod envelope;
pub mod error;
pub mod message;
pub mod types;

// Re-exports for convenience
pub use catalog::{
    AddUser, Command, GetNodeId, GetUsers, NodeIdReply, Reply, SendMessage, ServiceError,
    UpdateStatus, Users,
};
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use message::{Message, Request};
pub use types::{NodeId, SenderRef, User, UserStatus};
