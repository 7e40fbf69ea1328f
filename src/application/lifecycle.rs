//! Lifecycle manager - join and disconnect handling.
//!
//! Both operations change the registry and then trigger a presence
//! broadcast. A disconnect that changes nothing (never joined, already gone,
//! or a name already taken over) broadcasts nothing.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::chat::{ConnectionSession, Identity, DEFAULT_MAX_IDENTITY_LEN};
use crate::domain::foundation::{DomainError, ErrorCode, StateMachine, ValidationError};

use super::presence::PresenceBroadcaster;
use super::registry::{IdentityRegistry, Registration, Unregistration};

/// Why a join was refused. The registry was not touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("Invalid display name: {0}")]
    InvalidName(ValidationError),

    #[error("Connection is closed")]
    Closed,
}

impl From<JoinError> for DomainError {
    fn from(err: JoinError) -> Self {
        let code = match &err {
            JoinError::InvalidName(_) => ErrorCode::ValidationFailed,
            JoinError::Closed => ErrorCode::InvalidEvent,
        };
        DomainError::new(code, err.to_string())
    }
}

pub struct LifecycleManager {
    registry: Arc<IdentityRegistry>,
    presence: Arc<PresenceBroadcaster>,
    max_name_len: usize,
}

impl LifecycleManager {
    pub fn new(registry: Arc<IdentityRegistry>, presence: Arc<PresenceBroadcaster>) -> Self {
        Self {
            registry,
            presence,
            max_name_len: DEFAULT_MAX_IDENTITY_LEN,
        }
    }

    pub fn with_max_name_len(mut self, max_name_len: usize) -> Self {
        self.max_name_len = max_name_len;
        self
    }

    /// Join `session` under `name`, then broadcast presence.
    ///
    /// A name already held by another connection is taken over; that
    /// connection stays open but stops receiving direct messages.
    pub async fn join(
        &self,
        session: &mut ConnectionSession,
        name: impl Into<String>,
    ) -> Result<Registration, JoinError> {
        if session.phase().is_terminal() {
            return Err(JoinError::Closed);
        }
        let identity =
            Identity::parse(name, self.max_name_len).map_err(JoinError::InvalidName)?;

        let registration = self.registry.register(identity.clone(), session.id()).await;
        session
            .mark_joined(identity.clone())
            .map_err(|_| JoinError::Closed)?;

        if let Some(displaced) = registration.displaced {
            tracing::info!(
                identity = %identity,
                connection_id = %session.id(),
                displaced_connection_id = %displaced,
                "Identity taken over by newer connection"
            );
        }
        if let Some(previous) = &registration.renamed_from {
            tracing::info!(
                connection_id = %session.id(),
                from = %previous,
                to = %identity,
                "Connection re-joined under new name"
            );
        }
        tracing::info!(
            identity = %identity,
            connection_id = %session.id(),
            user_id = %session.user().id,
            "Connection joined"
        );

        self.presence.broadcast_presence().await;
        Ok(registration)
    }

    /// Handle transport close for `session`. Safe to call more than once.
    pub async fn disconnect(&self, session: &mut ConnectionSession) -> Unregistration {
        if !session.mark_disconnected() {
            return Unregistration::Unknown;
        }

        let outcome = self.registry.unregister(&session.id()).await;
        match &outcome {
            Unregistration::Released(identity) => {
                tracing::info!(
                    identity = %identity,
                    connection_id = %session.id(),
                    "Connection left"
                );
                self.presence.broadcast_presence().await;
            }
            Unregistration::Stale(identity) => {
                tracing::debug!(
                    identity = %identity,
                    connection_id = %session.id(),
                    "Stale connection closed, identity held elsewhere"
                );
            }
            Unregistration::Unknown => {
                tracing::debug!(connection_id = %session.id(), "Unjoined connection closed");
            }
        }
        outcome
    }
}
