//! WebSocket message types for the chat relay.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: connection status, chat messages, presence lists, errors, pongs
//! - Client → Server: join, send, ping

use serde::{Deserialize, Serialize};

use crate::domain::chat::{ChatMessage, Identity};
use crate::domain::foundation::{ConnectionId, DomainError, Timestamp};
use crate::ports::OutboundEvent;

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Socket accepted.
    Connected(ConnectedMessage),

    /// A routed chat message.
    ReceiveMessage(ReceiveMessage),

    /// Joined identities in join order.
    UserList(UserListMessage),

    /// Event rejected. Sent only to the offending connection.
    Error(ErrorMessage),

    /// Heartbeat response.
    Pong(PongMessage),
}

impl ServerMessage {
    pub fn connected(connection_id: ConnectionId) -> Self {
        ServerMessage::Connected(ConnectedMessage {
            connection_id: connection_id.to_string(),
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }

    pub fn pong() -> Self {
        ServerMessage::Pong(PongMessage {
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error(ErrorMessage {
            code: code.into(),
            message: message.into(),
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }
}

impl From<OutboundEvent> for ServerMessage {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::Message(message) => ServerMessage::ReceiveMessage(message.into()),
            OutboundEvent::PresenceList(identities) => ServerMessage::UserList(UserListMessage {
                users: identities.into_iter().map(Identity::into_inner).collect(),
            }),
        }
    }
}

impl From<DomainError> for ServerMessage {
    fn from(err: DomainError) -> Self {
        ServerMessage::error(err.code.to_string(), err.message)
    }
}

/// Sent once, right after the upgrade.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub connection_id: String,
    pub timestamp: String,
}

/// Wire form of a chat message. Also the history endpoint's item shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveMessage {
    pub id: String,
    pub user: String,
    pub text: String,
    /// `null` for broadcasts.
    pub to: Option<String>,
    pub created_at: String,
}

impl From<ChatMessage> for ReceiveMessage {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id().to_string(),
            user: message.sender().to_string(),
            text: message.text().to_string(),
            to: message.recipient().map(ToString::to_string),
            created_at: message.sent_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserListMessage {
    pub users: Vec<String>,
}

/// Error message sent to client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub timestamp: String,
}

/// Heartbeat response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Claim a display name.
    Join { name: String },

    /// Send a chat message. A `user` field, if present, is ignored.
    SendMessage {
        text: String,
        #[serde(default)]
        to: Option<String>,
    },

    /// Heartbeat request.
    Ping,
}
