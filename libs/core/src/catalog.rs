//! Every message the client and the presence service exchange
//!
//! Adding a message kind means adding a payload struct, its [`Message`]
//! impl (plus [`Request`] when the service answers it), and a variant in
//! [`Command`] or [`Reply`]. Transport code is generic over the traits and
//! does not change.

use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::message::{Message, Request};
use crate::types::{NodeId, SenderRef, User, UserStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUser {
    pub node_id: NodeId,
    pub display_name: String,
}

impl Message for AddUser {
    const TAG: &'static str = "AddUser";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub node_id: NodeId,
    pub user_status: UserStatus,
}

impl Message for UpdateStatus {
    const TAG: &'static str = "UpdateStatus";
}

/// A chat message from one sender
///
/// Exactly one of `nodeId` or `displayName` names the sender; a payload
/// carrying both or neither is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SendMessageFields")]
pub struct SendMessage {
    #[serde(flatten)]
    pub sender: SenderRef,
    pub content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageFields {
    node_id: Option<NodeId>,
    display_name: Option<String>,
    content: String,
}

impl TryFrom<SendMessageFields> for SendMessage {
    type Error = Error;

    fn try_from(fields: SendMessageFields) -> Result<Self> {
        let sender = match (fields.node_id, fields.display_name) {
            (Some(node_id), None) => SenderRef::NodeId(node_id),
            (None, Some(display_name)) => SenderRef::DisplayName(display_name),
            (Some(_), Some(_)) => {
                return Err(Error::InvalidSender("both nodeId and displayName present"))
            }
            (None, None) => return Err(Error::InvalidSender("missing nodeId or displayName")),
        };
        Ok(Self {
            sender,
            content: fields.content,
        })
    }
}

impl Message for SendMessage {
    const TAG: &'static str = "SendMessage";
}

/// Asks for every user the service knows about
///
/// Empty object on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUsers {}

impl Message for GetUsers {
    const TAG: &'static str = "GetUsers";
}

impl Request for GetUsers {
    type Response = Users;
}

/// User list in the order the service sent it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Users {
    pub users: Vec<User>,
}

impl Message for Users {
    const TAG: &'static str = "Users";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNodeId {
    pub display_name: String,
}

impl Message for GetNodeId {
    const TAG: &'static str = "GetNodeId";
}

impl Request for GetNodeId {
    type Response = NodeIdReply;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeIdReply {
    pub node_id: NodeId,
}

impl Message for NodeIdReply {
    const TAG: &'static str = "NodeId";
}

/// Sent by the service in place of the expected reply when it rejects a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    pub message: String,
}

impl Message for ServiceError {
    const TAG: &'static str = "Error";
}

/// Every request tag, decoded by dispatching on the envelope's `type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddUser(AddUser),
    UpdateStatus(UpdateStatus),
    SendMessage(SendMessage),
    GetUsers(GetUsers),
    GetNodeId(GetNodeId),
}

impl Command {
    pub fn from_envelope(envelope: &Envelope) -> Result<Self> {
        let tag = envelope.tag.as_str();
        if tag == AddUser::TAG {
            Ok(Command::AddUser(envelope.open()?))
        } else if tag == UpdateStatus::TAG {
            Ok(Command::UpdateStatus(envelope.open()?))
        } else if tag == SendMessage::TAG {
            Ok(Command::SendMessage(envelope.open()?))
        } else if tag == GetUsers::TAG {
            Ok(Command::GetUsers(envelope.open()?))
        } else if tag == GetNodeId::TAG {
            Ok(Command::GetNodeId(envelope.open()?))
        } else {
            Err(Error::UnknownMessageType(tag.to_string()))
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Command::AddUser(_) => AddUser::TAG,
            Command::UpdateStatus(_) => UpdateStatus::TAG,
            Command::SendMessage(_) => SendMessage::TAG,
            Command::GetUsers(_) => GetUsers::TAG,
            Command::GetNodeId(_) => GetNodeId::TAG,
        }
    }
}

/// Every response tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Users(Users),
    NodeId(NodeIdReply),
    Error(ServiceError),
}

impl Reply {
    pub fn from_envelope(envelope: &Envelope) -> Result<Self> {
        let tag = envelope.tag.as_str();
        if tag == Users::TAG {
            Ok(Reply::Users(envelope.open()?))
        } else if tag == NodeIdReply::TAG {
            Ok(Reply::NodeId(envelope.open()?))
        } else if tag == ServiceError::TAG {
            Ok(Reply::Error(envelope.open()?))
        } else {
            Err(Error::UnknownMessageType(tag.to_string()))
        }
    }
}

/// Every tag in the catalog, requests first
pub const TAGS: [&str; 8] = [
    AddUser::TAG,
    UpdateStatus::TAG,
    SendMessage::TAG,
    GetUsers::TAG,
    GetNodeId::TAG,
    Users::TAG,
    NodeIdReply::TAG,
    ServiceError::TAG,
];

/// Whether `tag` names any message in the catalog
pub fn is_known_tag(tag: &str) -> bool {
    TAGS.contains(&tag)
}
