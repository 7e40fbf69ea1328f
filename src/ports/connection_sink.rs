//! ConnectionSink port - outbound fan-out to live connections.
//!
//! The relay core decides *who* receives an event; the sink knows *how* to
//! reach a connection. The websocket adapter implements it with one queue per
//! socket. Tests implement it with a recorder.

use async_trait::async_trait;

use crate::domain::chat::{ChatMessage, Identity};
use crate::domain::foundation::ConnectionId;

/// Events the relay core pushes to connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// A routed chat message (`receive`).
    Message(ChatMessage),

    /// The full list of joined identities in registry order (`presence-list`).
    PresenceList(Vec<Identity>),
}

/// Delivers outbound events to transport connections.
#[async_trait]
pub trait ConnectionSink: Send + Sync {
    /// Deliver to one connection. Returns false if it is no longer attached.
    async fn deliver(&self, connection: &ConnectionId, event: OutboundEvent) -> bool;

    /// Deliver to every attached connection, joined or not.
    ///
    /// Returns how many connections the event was queued for.
    async fn deliver_all(&self, event: OutboundEvent) -> usize;
}
