//! Chat relay facade - the single entry point transports call into.
//!
//! Wires one registry into the router, lifecycle manager and presence
//! broadcaster so they always agree on who is joined.

use std::sync::Arc;

use crate::domain::chat::{
    ChatMessage, ConnectionSession, DEFAULT_MAX_IDENTITY_LEN, DEFAULT_MAX_TEXT_LEN,
};
use crate::ports::{ConnectionSink, MessageLog, MessageLogError};

use super::lifecycle::{JoinError, LifecycleManager};
use super::presence::PresenceBroadcaster;
use super::registry::{IdentityRegistry, Registration, Unregistration};
use super::router::{MessageRouter, RouteError, RouteReport, SendCommand};

/// Bounds applied to inbound events and history reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayLimits {
    pub max_display_name_len: usize,
    pub max_message_len: usize,
    pub history_default_limit: usize,
    pub history_max_limit: usize,
}

impl Default for RelayLimits {
    fn default() -> Self {
        Self {
            max_display_name_len: DEFAULT_MAX_IDENTITY_LEN,
            max_message_len: DEFAULT_MAX_TEXT_LEN,
            history_default_limit: 200,
            history_max_limit: 1000,
        }
    }
}

impl RelayLimits {
    /// Resolve a requested history size against the configured bounds.
    pub fn history_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.history_default_limit)
            .min(self.history_max_limit)
    }
}

pub struct ChatRelay {
    registry: Arc<IdentityRegistry>,
    router: MessageRouter,
    lifecycle: LifecycleManager,
    log: Arc<dyn MessageLog>,
    limits: RelayLimits,
}

impl ChatRelay {
    pub fn new(
        sink: Arc<dyn ConnectionSink>,
        log: Arc<dyn MessageLog>,
        limits: RelayLimits,
    ) -> Self {
        let registry = Arc::new(IdentityRegistry::new());
        let presence = Arc::new(PresenceBroadcaster::new(registry.clone(), sink.clone()));
        let router = MessageRouter::new(registry.clone(), sink, log.clone())
            .with_max_text_len(limits.max_message_len);
        let lifecycle = LifecycleManager::new(registry.clone(), presence)
            .with_max_name_len(limits.max_display_name_len);

        Self {
            registry,
            router,
            lifecycle,
            log,
            limits,
        }
    }

    pub fn limits(&self) -> &RelayLimits {
        &self.limits
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Handle a join event.
    pub async fn join(
        &self,
        session: &mut ConnectionSession,
        name: impl Into<String>,
    ) -> Result<Registration, JoinError> {
        self.lifecycle.join(session, name).await
    }

    /// Handle a send event.
    pub async fn send(
        &self,
        session: &ConnectionSession,
        command: SendCommand,
    ) -> Result<RouteReport, RouteError> {
        self.router.route(&session.id(), command).await
    }

    /// Handle a transport close.
    pub async fn disconnect(&self, session: &mut ConnectionSession) -> Unregistration {
        self.lifecycle.disconnect(session).await
    }

    /// Most recent stored messages, oldest first.
    pub async fn history(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>, MessageLogError> {
        self.log.recent(self.limits.history_limit(limit)).await
    }
}
