//! Presence broadcaster - pushes the joined-identity list to every connection.
//!
//! Snapshot and fan-out happen under one gate, so two overlapping membership
//! changes cannot deliver their lists out of order. The last list every
//! connection receives reflects the registry after the last change.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::chat::Identity;
use crate::ports::{ConnectionSink, OutboundEvent};

use super::registry::IdentityRegistry;

pub struct PresenceBroadcaster {
    registry: Arc<IdentityRegistry>,
    sink: Arc<dyn ConnectionSink>,
    gate: Mutex<()>,
}

impl PresenceBroadcaster {
    pub fn new(registry: Arc<IdentityRegistry>, sink: Arc<dyn ConnectionSink>) -> Self {
        Self {
            registry,
            sink,
            gate: Mutex::new(()),
        }
    }

    /// Send the current identity list, in join order, to every attached
    /// connection. Returns the list that was sent.
    pub async fn broadcast_presence(&self) -> Vec<Identity> {
        let _gate = self.gate.lock().await;

        let identities = self.registry.snapshot().await;
        let reached = self
            .sink
            .deliver_all(OutboundEvent::PresenceList(identities.clone()))
            .await;

        tracing::debug!(
            identities = identities.len(),
            connections = reached,
            "Presence list broadcast"
        );

        identities
    }
}
