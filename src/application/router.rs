//! Message router - classifies send events and fans them out.
//!
//! ```text
//! send event ──► resolve sender via registry ──► ChatMessage
//!                                                  │
//!                      ┌───────────────────────────┴──────────────┐
//!                      ▼                                          ▼
//!          spawn: MessageLog::append                  dispatch (inline)
//!          (failure logged, never retried)            broadcast → every connection
//!                                                     direct    → recipient + sender echo
//! ```
//!
//! Dispatch happens in the order `route` is called. Persistence runs as an
//! independent task with no ordering relative to dispatch: a message may be
//! seen live before, after, or without ever reaching the log.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::domain::chat::{ChatMessage, Delivery, Identity, DEFAULT_MAX_TEXT_LEN};
use crate::domain::foundation::{ConnectionId, DomainError, ErrorCode, ValidationError};
use crate::ports::{ConnectionSink, MessageLog, OutboundEvent};

use super::registry::IdentityRegistry;

/// Inbound send event, as decoded by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendCommand {
    pub text: String,
    /// `None` or an empty name means broadcast.
    pub to: Option<String>,
}

impl SendCommand {
    pub fn broadcast(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            to: None,
        }
    }

    pub fn direct(text: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            to: Some(to.into()),
        }
    }
}

/// Why a send event was discarded. Nothing was persisted or delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Connection has not joined")]
    NotJoined,

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(ValidationError),

    #[error("Invalid message: {0}")]
    InvalidMessage(ValidationError),
}

impl From<RouteError> for DomainError {
    fn from(err: RouteError) -> Self {
        let code = match &err {
            RouteError::NotJoined => ErrorCode::NotJoined,
            RouteError::InvalidRecipient(_) | RouteError::InvalidMessage(_) => {
                ErrorCode::ValidationFailed
            }
        };
        DomainError::new(code, err.to_string())
    }
}

/// Where a routed message went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Queued for this many connections.
    Broadcast { connections: usize },

    /// Recipient and sender echo, each `None` when not registered. When
    /// sender and recipient are the same identity only `recipient` is set.
    Direct {
        recipient: Option<ConnectionId>,
        echo: Option<ConnectionId>,
    },
}

/// Outcome of a successful `route` call.
#[derive(Debug)]
pub struct RouteReport {
    pub message: ChatMessage,
    pub dispatch: Dispatch,
    /// Resolves to true if the durable log accepted the message.
    pub persistence: JoinHandle<bool>,
}

/// Routes chat messages between joined connections.
pub struct MessageRouter {
    registry: Arc<IdentityRegistry>,
    sink: Arc<dyn ConnectionSink>,
    log: Arc<dyn MessageLog>,
    max_text_len: usize,
}

impl MessageRouter {
    pub fn new(
        registry: Arc<IdentityRegistry>,
        sink: Arc<dyn ConnectionSink>,
        log: Arc<dyn MessageLog>,
    ) -> Self {
        Self {
            registry,
            sink,
            log,
            max_text_len: DEFAULT_MAX_TEXT_LEN,
        }
    }

    /// Overrides the message length bound.
    pub fn with_max_text_len(mut self, max_text_len: usize) -> Self {
        self.max_text_len = max_text_len;
        self
    }

    /// Route a send event arriving on `from`.
    ///
    /// The sender is whatever identity `from` is registered as; a connection
    /// that never joined cannot send.
    pub async fn route(
        &self,
        from: &ConnectionId,
        command: SendCommand,
    ) -> Result<RouteReport, RouteError> {
        let sender = self
            .registry
            .identity_of(from)
            .await
            .ok_or(RouteError::NotJoined)?;

        let recipient = match command.to.filter(|to| !to.is_empty()) {
            // No length bound: an over-long name simply never resolves.
            Some(to) => Some(
                Identity::parse(to, usize::MAX).map_err(RouteError::InvalidRecipient)?,
            ),
            None => None,
        };

        let message = ChatMessage::new(sender, command.text, recipient, self.max_text_len)
            .map_err(RouteError::InvalidMessage)?;

        let persistence = self.persist(message.clone());
        let dispatch = self.dispatch(&message).await;

        tracing::debug!(
            message_id = %message.id(),
            sender = %message.sender(),
            recipient = message.recipient().map(Identity::as_str).unwrap_or("*"),
            ?dispatch,
            "Message routed"
        );

        Ok(RouteReport {
            message,
            dispatch,
            persistence,
        })
    }

    fn persist(&self, message: ChatMessage) -> JoinHandle<bool> {
        let log = Arc::clone(&self.log);
        tokio::spawn(async move {
            match log.append(&message).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(
                        message_id = %message.id(),
                        sender = %message.sender(),
                        "Failed to persist message: {}",
                        e
                    );
                    false
                }
            }
        })
    }

    async fn dispatch(&self, message: &ChatMessage) -> Dispatch {
        match message.delivery() {
            Delivery::Broadcast => {
                let connections = self
                    .sink
                    .deliver_all(OutboundEvent::Message(message.clone()))
                    .await;
                Dispatch::Broadcast { connections }
            }
            Delivery::Direct(to) => {
                let recipient = self.registry.lookup(to).await;
                let sender = self.registry.lookup(message.sender()).await;

                if let Some(conn) = recipient {
                    self.sink
                        .deliver(&conn, OutboundEvent::Message(message.clone()))
                        .await;
                }

                // Sender and recipient may resolve to the same handle.
                let echo = sender.filter(|conn| Some(*conn) != recipient);
                if let Some(conn) = echo {
                    self.sink
                        .deliver(&conn, OutboundEvent::Message(message.clone()))
                        .await;
                }

                if recipient.is_none() {
                    tracing::debug!(
                        message_id = %message.id(),
                        recipient = %to,
                        "Recipient offline, live delivery dropped"
                    );
                }

                Dispatch::Direct { recipient, echo }
            }
        }
    }
}
