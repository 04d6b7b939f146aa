use std::net::SocketAddr;

use presence_core::{
    AddUser, GetNodeId, GetUsers, NodeId, SendMessage, SenderRef, UpdateStatus, User, UserStatus,
};
use presence_fabric::{Channel, Correlator, Result};
use tracing::{debug, info};

use crate::config::ClientConfig;

/// Handle to one presence service connection
///
/// Every method may be called concurrently from several tasks; requests are
/// queued and sent one at a time. Errors are returned, never logged and
/// swallowed. Use
/// [`Error::connection_usable`](crate::Error::connection_usable) to decide
/// whether to reconnect.
pub struct Client {
    correlator: Correlator,
    peer: SocketAddr,
}

impl Client {
    /// Connect with the default [`ClientConfig`]
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        Self::connect_with(addr, &ClientConfig::default()).await
    }

    pub async fn connect_with(addr: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let transport = config.transport(addr).connect().await?;
        let peer = transport.peer_addr()?;
        info!(%peer, "connected to presence service");

        Ok(Self {
            correlator: Correlator::new(Channel::from_transport(transport)),
            peer,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// False once the connection is closed or broken
    pub async fn is_usable(&self) -> bool {
        self.correlator.is_usable().await
    }

    pub async fn add_user(
        &self,
        node_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<()> {
        let request = AddUser {
            node_id: NodeId::new(node_id)?,
            display_name: display_name.into(),
        };
        debug!(node_id = %request.node_id, "add user");
        self.correlator.send(&request).await
    }

    pub async fn update_status(&self, node_id: impl Into<String>, status: UserStatus) -> Result<()> {
        let request = UpdateStatus {
            node_id: NodeId::new(node_id)?,
            user_status: status,
        };
        debug!(node_id = %request.node_id, %status, "update status");
        self.correlator.send(&request).await
    }

    pub async fn send_message(
        &self,
        sender: impl Into<SenderRef>,
        content: impl Into<String>,
    ) -> Result<()> {
        let request = SendMessage {
            sender: sender.into(),
            content: content.into(),
        };
        debug!(bytes = request.content.len(), "send message");
        self.correlator.send(&request).await
    }

    /// Every user the service knows about, in the order it sent them
    pub async fn get_users(&self) -> Result<Vec<User>> {
        let reply = self.correlator.exchange(&GetUsers {}).await?;
        debug!(count = reply.users.len(), "got users");
        Ok(reply.users)
    }

    pub async fn get_node_id(&self, display_name: impl Into<String>) -> Result<NodeId> {
        let request = GetNodeId {
            display_name: display_name.into(),
        };
        let reply = self.correlator.exchange(&request).await?;
        Ok(reply.node_id)
    }

    /// Release the socket
    ///
    /// Safe to call repeatedly; later calls on this client fail with
    /// `ConnectionClosed`.
    pub async fn close(&self) {
        if self.correlator.close().await {
            info!(peer = %self.peer, "presence connection closed");
        }
    }
}
