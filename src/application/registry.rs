//! Identity registry - the live mapping between display names and connections.
//!
//! Two views over one relation, guarded together:
//!
//! ```text
//! by_identity (insertion ordered)    by_connection
//! ├── alice → conn-1                 ├── conn-1 → alice
//! ├── bob   → conn-4                 ├── conn-4 → bob
//! └── carol → conn-7                 ├── conn-7 → carol
//!                                    └── conn-2 → alice   (stale, alice moved)
//! ```
//!
//! Every forward entry has its matching reverse entry, and no connection
//! holds two identities at once. A reverse entry may outlive its forward
//! entry when a second connection joins under the same name (last join
//! wins); it is dropped when that older connection disconnects.

use std::collections::HashMap;

use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::domain::chat::Identity;
use crate::domain::foundation::ConnectionId;

/// Result of a `register` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    /// Connection that previously held this identity, now stale.
    pub displaced: Option<ConnectionId>,

    /// Name this connection held before re-joining under a new one.
    pub renamed_from: Option<Identity>,
}

/// Result of an `unregister` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unregistration {
    /// The connection was never registered, or already removed.
    Unknown,

    /// The connection's name had already been taken over by a newer
    /// connection; only the stale reverse entry was dropped.
    Stale(Identity),

    /// The identity left the registry.
    Released(Identity),
}

impl Unregistration {
    /// True when the set of joined identities changed.
    pub fn changed_membership(&self) -> bool {
        matches!(self, Unregistration::Released(_))
    }
}

#[derive(Debug, Default)]
struct RegistryMaps {
    by_identity: IndexMap<Identity, ConnectionId>,
    by_connection: HashMap<ConnectionId, Identity>,
}

/// Identity registry shared by the router, lifecycle manager and presence
/// broadcaster.
///
/// # Thread Safety
///
/// Both maps sit behind one `RwLock`, so no mutation is ever observed half
/// applied. Routing lookups (reads) vastly outnumber joins and leaves.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    maps: RwLock<RegistryMaps>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `identity` to `connection` and back.
    ///
    /// If another connection held the name, its forward entry is overwritten
    /// and its reverse entry is left in place until it disconnects. If this
    /// connection was joined under a different name, that name is released.
    pub async fn register(&self, identity: Identity, connection: ConnectionId) -> Registration {
        let mut maps = self.maps.write().await;
        let mut registration = Registration::default();

        if let Some(previous) = maps.by_connection.get(&connection).cloned() {
            if previous != identity && maps.by_identity.get(&previous) == Some(&connection) {
                maps.by_identity.shift_remove(&previous);
                registration.renamed_from = Some(previous);
            }
        }

        // IndexMap keeps the original slot when the key already exists.
        registration.displaced = maps
            .by_identity
            .insert(identity.clone(), connection)
            .filter(|old| *old != connection);
        maps.by_connection.insert(connection, identity);

        registration
    }

    /// Remove whatever `connection` is registered as. Unknown connections are
    /// a no-op.
    ///
    /// The forward entry is deleted only while it still points at
    /// `connection`; a name taken over by a newer connection stays with it
    /// (see "Stale disconnect" in DESIGN.md).
    pub async fn unregister(&self, connection: &ConnectionId) -> Unregistration {
        let mut maps = self.maps.write().await;

        let Some(identity) = maps.by_connection.remove(connection) else {
            return Unregistration::Unknown;
        };

        if maps.by_identity.get(&identity) == Some(connection) {
            maps.by_identity.shift_remove(&identity);
            Unregistration::Released(identity)
        } else {
            Unregistration::Stale(identity)
        }
    }

    /// Connection currently holding `identity`.
    pub async fn lookup(&self, identity: &Identity) -> Option<ConnectionId> {
        self.maps.read().await.by_identity.get(identity).copied()
    }

    /// Identity `connection` is registered as, stale entries included.
    pub async fn identity_of(&self, connection: &ConnectionId) -> Option<Identity> {
        self.maps.read().await.by_connection.get(connection).cloned()
    }

    /// Joined identities in insertion order.
    pub async fn snapshot(&self) -> Vec<Identity> {
        self.maps.read().await.by_identity.keys().cloned().collect()
    }

    /// Number of joined identities.
    pub async fn len(&self) -> usize {
        self.maps.read().await.by_identity.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Panics if the cross-map invariant is broken.
    #[cfg(test)]
    async fn assert_consistent(&self) {
        let maps = self.maps.read().await;
        for (identity, connection) in &maps.by_identity {
            assert_eq!(
                maps.by_connection.get(connection),
                Some(identity),
                "forward entry {identity} -> {connection} has no matching reverse entry"
            );
        }
        let mut holders: Vec<&ConnectionId> = maps.by_identity.values().collect();
        holders.sort_by_key(|c| *c.as_uuid());
        holders.dedup();
        assert_eq!(
            holders.len(),
            maps.by_identity.len(),
            "one connection holds two identities"
        );
        assert!(maps.by_connection.len() >= maps.by_identity.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(name: &str) -> Identity {
        Identity::new(name).unwrap()
    }

    #[tokio::test]
    async fn register_then_lookup_resolves_connection() {
        let registry = IdentityRegistry::new();
        let conn = ConnectionId::new();

        let reg = registry.register(id("alice"), conn).await;

        assert_eq!(reg, Registration::default());
        assert_eq!(registry.lookup(&id("alice")).await, Some(conn));
        assert_eq!(registry.identity_of(&conn).await, Some(id("alice")));
    }

    #[tokio::test]
    async fn second_join_with_same_name_wins() {
        let registry = IdentityRegistry::new();
        let first = ConnectionId::new();
        let second = ConnectionId::new();

        registry.register(id("alice"), first).await;
        let reg = registry.register(id("alice"), second).await;

        assert_eq!(reg.displaced, Some(first));
        assert_eq!(registry.lookup(&id("alice")).await, Some(second));
        // The first connection's reverse entry stays until it disconnects.
        assert_eq!(registry.identity_of(&first).await, Some(id("alice")));
        registry.assert_consistent().await;
    }

    #[tokio::test]
    async fn stale_disconnect_keeps_newer_holder() {
        let registry = IdentityRegistry::new();
        let first = ConnectionId::new();
        let second = ConnectionId::new();
        registry.register(id("alice"), first).await;
        registry.register(id("alice"), second).await;

        let outcome = registry.unregister(&first).await;

        assert_eq!(outcome, Unregistration::Stale(id("alice")));
        assert!(!outcome.changed_membership());
        assert_eq!(registry.lookup(&id("alice")).await, Some(second));
        assert_eq!(registry.identity_of(&first).await, None);
    }

    #[tokio::test]
    async fn unregister_removes_both_directions() {
        let registry = IdentityRegistry::new();
        let conn = ConnectionId::new();
        registry.register(id("bob"), conn).await;

        let outcome = registry.unregister(&conn).await;

        assert_eq!(outcome, Unregistration::Released(id("bob")));
        assert!(registry.lookup(&id("bob")).await.is_none());
        assert!(registry.identity_of(&conn).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn unregister_unknown_connection_is_noop() {
        let registry = IdentityRegistry::new();
        let conn = ConnectionId::new();
        registry.register(id("bob"), conn).await;

        assert_eq!(
            registry.unregister(&ConnectionId::new()).await,
            Unregistration::Unknown
        );
        registry.unregister(&conn).await;
        assert_eq!(registry.unregister(&conn).await, Unregistration::Unknown);
    }

    #[tokio::test]
    async fn snapshot_follows_insertion_order() {
        let registry = IdentityRegistry::new();
        let a = ConnectionId::new();
        registry.register(id("carol"), a).await;
        registry.register(id("alice"), ConnectionId::new()).await;
        registry.register(id("bob"), ConnectionId::new()).await;

        assert_eq!(
            registry.snapshot().await,
            vec![id("carol"), id("alice"), id("bob")]
        );

        registry.unregister(&a).await;
        assert_eq!(registry.snapshot().await, vec![id("alice"), id("bob")]);
    }

    #[tokio::test]
    async fn takeover_keeps_original_slot_in_snapshot() {
        let registry = IdentityRegistry::new();
        registry.register(id("alice"), ConnectionId::new()).await;
        registry.register(id("bob"), ConnectionId::new()).await;
        registry.register(id("alice"), ConnectionId::new()).await;

        assert_eq!(registry.snapshot().await, vec![id("alice"), id("bob")]);
    }

    #[tokio::test]
    async fn rejoin_under_new_name_releases_old_name() {
        let registry = IdentityRegistry::new();
        let conn = ConnectionId::new();
        registry.register(id("alice"), conn).await;

        let reg = registry.register(id("alicia"), conn).await;

        assert_eq!(reg.renamed_from, Some(id("alice")));
        assert!(registry.lookup(&id("alice")).await.is_none());
        assert_eq!(registry.lookup(&id("alicia")).await, Some(conn));
        registry.assert_consistent().await;
    }

    #[tokio::test]
    async fn rejoin_under_same_name_is_idempotent() {
        let registry = IdentityRegistry::new();
        let conn = ConnectionId::new();
        registry.register(id("alice"), conn).await;

        let reg = registry.register(id("alice"), conn).await;

        assert_eq!(reg, Registration::default());
        assert_eq!(registry.len().await, 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Register { name: usize, conn: usize },
        Unregister { conn: usize },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..4usize, 0..6usize).prop_map(|(name, conn)| Op::Register { name, conn }),
            (0..6usize).prop_map(|conn| Op::Unregister { conn }),
        ]
    }

    proptest! {
        #[test]
        fn maps_stay_consistent_under_any_sequence(ops in proptest::collection::vec(op(), 0..60)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let names = ["alice", "bob", "carol", "dave"];
                let conns: Vec<ConnectionId> = (0..6).map(|_| ConnectionId::new()).collect();
                let registry = IdentityRegistry::new();

                for op in ops {
                    match op {
                        Op::Register { name, conn } => {
                            registry.register(id(names[name]), conns[conn]).await;
                        }
                        Op::Unregister { conn } => {
                            registry.unregister(&conns[conn]).await;
                        }
                    }
                    registry.assert_consistent().await;
                }
            });
        }
    }
}
