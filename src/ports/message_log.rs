//! MessageLog port - the durable-log collaborator.
//!
//! Every routed message is appended here. The router launches the append as
//! its own task and never waits on it before dispatching, so a message can be
//! delivered live and still fail to persist. Failures are logged, never
//! surfaced to the sender, and never retried.
//!
//! The log also backs the read-only history endpoint.

use async_trait::async_trait;

use crate::domain::chat::ChatMessage;

/// Errors that can occur in message log operations.
#[derive(Debug, thiserror::Error)]
pub enum MessageLogError {
    /// Storage backend communication error
    #[error("Database error: {0}")]
    Database(String),

    /// Stored row could not be turned back into a message
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Backend is not accepting writes
    #[error("Message log unavailable: {0}")]
    Unavailable(String),
}

/// Append-only store of chat messages.
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Persist one message.
    async fn append(&self, message: &ChatMessage) -> Result<(), MessageLogError>;

    /// Most recent `limit` messages, returned oldest first.
    async fn recent(&self, limit: usize) -> Result<Vec<ChatMessage>, MessageLogError>;
}
