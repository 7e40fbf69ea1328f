//! Per-connection lifecycle: Connecting → Joined → Disconnected.

use serde::Serialize;
use std::fmt;

use crate::domain::foundation::{
    AuthenticatedUser, ConnectionId, StateMachine, Timestamp, ValidationError,
};

use super::Identity;

/// Lifecycle phase of one transport connection.
///
/// Valid transitions:
/// - Connecting -> Joined (join event)
/// - Joined -> Joined (repeat join; the registry's last-write-wins absorbs it)
/// - Connecting | Joined -> Disconnected (transport close)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    #[default]
    Connecting,
    Joined,
    Disconnected,
}

impl StateMachine for ConnectionPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionPhase::*;
        matches!(
            (self, target),
            (Connecting, Joined) | (Joined, Joined) | (Connecting, Disconnected) | (Joined, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionPhase::*;
        match self {
            Connecting => vec![Joined, Disconnected],
            Joined => vec![Joined, Disconnected],
            Disconnected => vec![],
        }
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionPhase::Connecting => "connecting",
            ConnectionPhase::Joined => "joined",
            ConnectionPhase::Disconnected => "disconnected",
        };
        f.write_str(s)
    }
}

/// Transport-side view of one authenticated connection.
///
/// Owned by the transport adapter for the lifetime of the socket. The
/// identity recorded here is what this connection last joined as; the
/// registry remains the source of truth for routing.
#[derive(Debug, Clone)]
pub struct ConnectionSession {
    id: ConnectionId,
    user: AuthenticatedUser,
    phase: ConnectionPhase,
    identity: Option<Identity>,
    connected_at: Timestamp,
}

impl ConnectionSession {
    /// A freshly accepted connection, authenticated but not yet joined.
    pub fn new(id: ConnectionId, user: AuthenticatedUser) -> Self {
        Self {
            id,
            user,
            phase: ConnectionPhase::Connecting,
            identity: None,
            connected_at: Timestamp::now(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user(&self) -> &AuthenticatedUser {
        &self.user
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn connected_at(&self) -> Timestamp {
        self.connected_at
    }

    /// Records a join under `identity`.
    pub fn mark_joined(&mut self, identity: Identity) -> Result<(), ValidationError> {
        self.phase = self.phase.transition_to(ConnectionPhase::Joined)?;
        self.identity = Some(identity);
        Ok(())
    }

    /// Records the transport close. Idempotent.
    ///
    /// Returns false if the session was already disconnected.
    pub fn mark_disconnected(&mut self) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = ConnectionPhase::Disconnected;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    fn session() -> ConnectionSession {
        let user = AuthenticatedUser::new(UserId::new("u-1").unwrap(), None, None);
        ConnectionSession::new(ConnectionId::new(), user)
    }

    #[test]
    fn new_session_is_connecting() {
        let s = session();
        assert_eq!(s.phase(), ConnectionPhase::Connecting);
        assert!(s.identity().is_none());
    }

    #[test]
    fn connecting_can_join() {
        let mut s = session();
        s.mark_joined(Identity::new("alice").unwrap()).unwrap();
        assert_eq!(s.phase(), ConnectionPhase::Joined);
        assert_eq!(s.identity().map(Identity::as_str), Some("alice"));
    }

    #[test]
    fn joined_can_join_again_under_another_name() {
        let mut s = session();
        s.mark_joined(Identity::new("alice").unwrap()).unwrap();
        s.mark_joined(Identity::new("alicia").unwrap()).unwrap();
        assert_eq!(s.identity().map(Identity::as_str), Some("alicia"));
    }

    #[test]
    fn disconnected_is_terminal() {
        let mut s = session();
        assert!(s.mark_disconnected());
        assert!(s.phase().is_terminal());
        assert!(s.mark_joined(Identity::new("late").unwrap()).is_err());
    }

    #[test]
    fn disconnect_is_idempotent() {
        let mut s = session();
        assert!(s.mark_disconnected());
        assert!(!s.mark_disconnected());
        assert_eq!(s.phase(), ConnectionPhase::Disconnected);
    }

    #[test]
    fn transition_table_matches_lifecycle() {
        use ConnectionPhase::*;
        assert!(Connecting.can_transition_to(&Joined));
        assert!(Joined.can_transition_to(&Joined));
        assert!(Connecting.can_transition_to(&Disconnected));
        assert!(!Disconnected.can_transition_to(&Joined));
        assert!(!Joined.can_transition_to(&Connecting));
    }
}
