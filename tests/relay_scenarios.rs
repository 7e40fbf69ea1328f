//! End-to-end relay scenarios driven through `ChatRelay`.
//!
//! A recording sink stands in for the websocket hub so each test can assert
//! exactly which connections saw which events.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use chat_relay::adapters::InMemoryMessageLog;
use chat_relay::application::{ChatRelay, RelayLimits, SendCommand, Unregistration};
use chat_relay::domain::chat::{ChatMessage, ConnectionPhase, ConnectionSession, Identity};
use chat_relay::domain::foundation::{AuthenticatedUser, ConnectionId, UserId};
use chat_relay::ports::{ConnectionSink, MessageLog, MessageLogError, OutboundEvent};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Sink that records every event per attached connection.
#[derive(Default)]
struct RecordingSink {
    inboxes: Mutex<HashMap<ConnectionId, Vec<OutboundEvent>>>,
}

impl RecordingSink {
    fn attach(&self, connection: ConnectionId) {
        self.inboxes.lock().unwrap().insert(connection, Vec::new());
    }

    fn detach(&self, connection: &ConnectionId) {
        self.inboxes.lock().unwrap().remove(connection);
    }

    fn messages_for(&self, connection: &ConnectionId) -> Vec<ChatMessage> {
        self.inboxes
            .lock()
            .unwrap()
            .get(connection)
            .map(|events| {
                events
                    .iter()
                    .filter_map(|e| match e {
                        OutboundEvent::Message(m) => Some(m.clone()),
                        OutboundEvent::PresenceList(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn last_presence_for(&self, connection: &ConnectionId) -> Option<Vec<String>> {
        self.inboxes
            .lock()
            .unwrap()
            .get(connection)?
            .iter()
            .rev()
            .find_map(|e| match e {
                OutboundEvent::PresenceList(list) => {
                    Some(list.iter().map(|i| i.as_str().to_string()).collect())
                }
                OutboundEvent::Message(_) => None,
            })
    }

    fn presence_count_for(&self, connection: &ConnectionId) -> usize {
        self.inboxes
            .lock()
            .unwrap()
            .get(connection)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| matches!(e, OutboundEvent::PresenceList(_)))
                    .count()
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl ConnectionSink for RecordingSink {
    async fn deliver(&self, connection: &ConnectionId, event: OutboundEvent) -> bool {
        match self.inboxes.lock().unwrap().get_mut(connection) {
            Some(inbox) => {
                inbox.push(event);
                true
            }
            None => false,
        }
    }

    async fn deliver_all(&self, event: OutboundEvent) -> usize {
        let mut inboxes = self.inboxes.lock().unwrap();
        for inbox in inboxes.values_mut() {
            inbox.push(event.clone());
        }
        inboxes.len()
    }
}

/// Log whose appends always fail.
struct BrokenLog;

#[async_trait]
impl MessageLog for BrokenLog {
    async fn append(&self, _message: &ChatMessage) -> Result<(), MessageLogError> {
        Err(MessageLogError::Database("disk full".to_string()))
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<ChatMessage>, MessageLogError> {
        Ok(Vec::new())
    }
}

struct Harness {
    relay: ChatRelay,
    sink: Arc<RecordingSink>,
    log: Arc<InMemoryMessageLog>,
}

impl Harness {
    fn new() -> Self {
        let sink = Arc::new(RecordingSink::default());
        let log = Arc::new(InMemoryMessageLog::new());
        let relay = ChatRelay::new(sink.clone(), log.clone(), RelayLimits::default());
        Self { relay, sink, log }
    }

    fn connect(&self, user: &str) -> ConnectionSession {
        let user = AuthenticatedUser::new(UserId::new(user).unwrap(), None, None);
        let session = ConnectionSession::new(ConnectionId::new(), user);
        self.sink.attach(session.id());
        session
    }

    async fn join(&self, user: &str, name: &str) -> ConnectionSession {
        let mut session = self.connect(user);
        self.relay.join(&mut session, name).await.unwrap();
        session
    }

    async fn close(&self, session: &mut ConnectionSession) -> Unregistration {
        self.sink.detach(&session.id());
        self.relay.disconnect(session).await
    }
}

fn texts(messages: &[ChatMessage]) -> Vec<&str> {
    messages.iter().map(|m| m.text()).collect()
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn broadcast_reaches_every_connection_including_sender() {
    let h = Harness::new();
    let alice = h.join("u1", "alice").await;
    let bob = h.join("u2", "bob").await;
    let carol = h.join("u3", "carol").await;

    let report = h
        .relay
        .send(&alice, SendCommand::broadcast("hello all"))
        .await
        .unwrap();
    assert!(report.persistence.await.unwrap());

    for session in [&alice, &bob, &carol] {
        assert_eq!(texts(&h.sink.messages_for(&session.id())), ["hello all"]);
    }
    assert_eq!(h.log.len(), 1);
}

#[tokio::test]
async fn broadcast_reaches_connections_that_have_not_joined() {
    let h = Harness::new();
    let alice = h.join("u1", "alice").await;
    let lurker = h.connect("u9");

    h.relay
        .send(&alice, SendCommand::broadcast("anyone there"))
        .await
        .unwrap();

    assert_eq!(texts(&h.sink.messages_for(&lurker.id())), ["anyone there"]);
}

#[tokio::test]
async fn direct_message_reaches_recipient_and_echoes_to_sender_only() {
    let h = Harness::new();
    let alice = h.join("u1", "alice").await;
    let bob = h.join("u2", "bob").await;
    let carol = h.join("u3", "carol").await;

    h.relay
        .send(&alice, SendCommand::direct("psst", "bob"))
        .await
        .unwrap();

    assert_eq!(texts(&h.sink.messages_for(&alice.id())), ["psst"]);
    assert_eq!(texts(&h.sink.messages_for(&bob.id())), ["psst"]);
    assert!(h.sink.messages_for(&carol.id()).is_empty());

    let delivered = &h.sink.messages_for(&bob.id())[0];
    assert_eq!(delivered.sender().as_str(), "alice");
    assert_eq!(delivered.recipient().map(Identity::as_str), Some("bob"));
}

#[tokio::test]
async fn direct_message_to_offline_recipient_is_persisted_and_echoed() {
    let h = Harness::new();
    let alice = h.join("u1", "alice").await;
    let bob = h.join("u2", "bob").await;

    let report = h
        .relay
        .send(&alice, SendCommand::direct("anyone?", "ghost"))
        .await
        .unwrap();
    assert!(report.persistence.await.unwrap());

    assert_eq!(texts(&h.sink.messages_for(&alice.id())), ["anyone?"]);
    assert!(h.sink.messages_for(&bob.id()).is_empty());
    assert_eq!(h.log.len(), 1);
}

#[tokio::test]
async fn direct_message_to_self_is_delivered_once() {
    let h = Harness::new();
    let alice = h.join("u1", "alice").await;

    h.relay
        .send(&alice, SendCommand::direct("note to self", "alice"))
        .await
        .unwrap();

    assert_eq!(texts(&h.sink.messages_for(&alice.id())), ["note to self"]);
}

#[tokio::test]
async fn persistence_failure_does_not_block_dispatch() {
    let sink = Arc::new(RecordingSink::default());
    let relay = ChatRelay::new(sink.clone(), Arc::new(BrokenLog), RelayLimits::default());

    let user = AuthenticatedUser::new(UserId::new("u1").unwrap(), None, None);
    let mut alice = ConnectionSession::new(ConnectionId::new(), user);
    sink.attach(alice.id());
    relay.join(&mut alice, "alice").await.unwrap();

    let report = relay
        .send(&alice, SendCommand::broadcast("still delivered"))
        .await
        .unwrap();

    assert!(!report.persistence.await.unwrap());
    assert_eq!(texts(&sink.messages_for(&alice.id())), ["still delivered"]);
}

#[tokio::test]
async fn sending_before_join_mutates_nothing() {
    let h = Harness::new();
    let stranger = h.connect("u1");
    let bob = h.join("u2", "bob").await;

    assert!(h
        .relay
        .send(&stranger, SendCommand::broadcast("hi"))
        .await
        .is_err());

    assert!(h.sink.messages_for(&bob.id()).is_empty());
    assert!(h.log.is_empty());
}

// =============================================================================
// Identity and presence
// =============================================================================

#[tokio::test]
async fn presence_after_alice_bob_then_alice_leaves_is_bob() {
    let h = Harness::new();
    let mut alice = h.join("u1", "alice").await;
    let bob = h.join("u2", "bob").await;
    assert_eq!(
        h.sink.last_presence_for(&bob.id()),
        Some(vec!["alice".to_string(), "bob".to_string()])
    );

    let outcome = h.close(&mut alice).await;
    assert!(matches!(outcome, Unregistration::Released(_)));
    assert_eq!(alice.phase(), ConnectionPhase::Disconnected);

    assert_eq!(
        h.sink.last_presence_for(&bob.id()),
        Some(vec!["bob".to_string()])
    );
}

#[tokio::test]
async fn second_join_with_same_name_takes_over_until_old_connection_closes() {
    let h = Harness::new();
    let mut first = h.join("u1", "alice").await;
    let second = h.join("u2", "alice").await;
    let name = Identity::new("alice").unwrap();

    assert_eq!(h.relay.registry().lookup(&name).await, Some(second.id()));
    assert_eq!(
        h.relay.registry().identity_of(&first.id()).await,
        Some(name.clone())
    );

    let broadcasts_before = h.sink.presence_count_for(&second.id());
    let outcome = h.close(&mut first).await;

    assert!(matches!(outcome, Unregistration::Stale(_)));
    assert_eq!(h.relay.registry().lookup(&name).await, Some(second.id()));
    assert_eq!(h.relay.registry().identity_of(&first.id()).await, None);
    assert_eq!(h.sink.presence_count_for(&second.id()), broadcasts_before);
}

#[tokio::test]
async fn direct_message_follows_the_newest_holder_of_a_name() {
    let h = Harness::new();
    let old_bob = h.join("u1", "bob").await;
    let new_bob = h.join("u2", "bob").await;
    let alice = h.join("u3", "alice").await;

    h.relay
        .send(&alice, SendCommand::direct("which bob?", "bob"))
        .await
        .unwrap();

    assert_eq!(texts(&h.sink.messages_for(&new_bob.id())), ["which bob?"]);
    assert!(h.sink.messages_for(&old_bob.id()).is_empty());
}

#[tokio::test]
async fn double_disconnect_is_a_silent_no_op() {
    let h = Harness::new();
    let mut alice = h.join("u1", "alice").await;
    let bob = h.join("u2", "bob").await;

    h.close(&mut alice).await;
    let broadcasts = h.sink.presence_count_for(&bob.id());

    let again = h.relay.disconnect(&mut alice).await;
    assert_eq!(again, Unregistration::Unknown);
    assert_eq!(h.sink.presence_count_for(&bob.id()), broadcasts);
    assert_eq!(
        h.sink.last_presence_for(&bob.id()),
        Some(vec!["bob".to_string()])
    );
}

#[tokio::test]
async fn disconnect_without_join_does_not_broadcast() {
    let h = Harness::new();
    let bob = h.join("u2", "bob").await;
    let mut lurker = h.connect("u9");
    let broadcasts = h.sink.presence_count_for(&bob.id());

    assert_eq!(h.close(&mut lurker).await, Unregistration::Unknown);
    assert_eq!(h.sink.presence_count_for(&bob.id()), broadcasts);
}

#[tokio::test]
async fn invalid_join_leaves_registry_untouched() {
    let h = Harness::new();
    let mut session = h.connect("u1");

    assert!(h.relay.join(&mut session, "   ").await.is_err());
    assert_eq!(h.relay.registry().len().await, 0);
    assert_eq!(session.phase(), ConnectionPhase::Connecting);
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn history_returns_recent_messages_oldest_first() {
    let h = Harness::new();
    let alice = h.join("u1", "alice").await;

    for text in ["one", "two", "three"] {
        let report = h
            .relay
            .send(&alice, SendCommand::broadcast(text))
            .await
            .unwrap();
        report.persistence.await.unwrap();
    }

    let all = h.relay.history(None).await.unwrap();
    assert_eq!(texts(&all), ["one", "two", "three"]);

    let last_two = h.relay.history(Some(2)).await.unwrap();
    assert_eq!(texts(&last_two), ["two", "three"]);
}
