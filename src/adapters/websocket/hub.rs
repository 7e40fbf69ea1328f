//! Live connection table for the websocket transport.
//!
//! Every accepted socket gets an unbounded queue. The socket's writer task
//! drains it, so routing never waits on a slow client.
//!
//! ```text
//! ConnectionHub
//! ├── conn-1 → tx ──► writer task ──► socket
//! ├── conn-2 → tx ──► writer task ──► socket
//! └── conn-3 → tx ──► writer task ──► socket
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use crate::domain::foundation::ConnectionId;
use crate::ports::{ConnectionSink, OutboundEvent};

use super::messages::ServerMessage;

/// Manages the queues of all attached websocket connections.
///
/// # Thread Safety
///
/// Uses `RwLock` since fan-outs (reads) vastly outnumber attaches and
/// detaches (writes).
#[derive(Debug, Default)]
pub struct ConnectionHub {
    connections: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return the queue its writer task drains.
    pub async fn attach(
        &self,
        connection: ConnectionId,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.write().await.insert(connection, tx);
        rx
    }

    /// Drop a connection's queue. Its writer task ends once the queue drains.
    pub async fn detach(&self, connection: &ConnectionId) -> bool {
        self.connections.write().await.remove(connection).is_some()
    }

    /// Queue a transport-level frame (pong, error) for one connection.
    pub async fn send_direct(&self, connection: &ConnectionId, message: ServerMessage) -> bool {
        match self.connections.read().await.get(connection) {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Number of attached connections, joined or not.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[async_trait]
impl ConnectionSink for ConnectionHub {
    async fn deliver(&self, connection: &ConnectionId, event: OutboundEvent) -> bool {
        self.send_direct(connection, event.into()).await
    }

    async fn deliver_all(&self, event: OutboundEvent) -> usize {
        let message = ServerMessage::from(event);
        let connections = self.connections.read().await;

        connections
            .values()
            .filter(|tx| tx.send(message.clone()).is_ok())
            .count()
    }
}
