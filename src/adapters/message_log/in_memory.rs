//! In-memory message log.
//!
//! The default when no database URL is configured. Does not persist data
//! across restarts, and keeps only the newest `capacity` messages: older
//! ones could never be served by the history endpoint anyway.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::chat::ChatMessage;
use crate::ports::{MessageLog, MessageLogError};

/// Capacity used by [`InMemoryMessageLog::new`].
pub const DEFAULT_IN_MEMORY_CAPACITY: usize = 1000;

/// In-memory implementation of the MessageLog port.
///
/// Messages are held ordered by `sent_at`; once `capacity` is reached each
/// append evicts the oldest message.
#[derive(Debug)]
pub struct InMemoryMessageLog {
    messages: Mutex<VecDeque<ChatMessage>>,
    capacity: usize,
}

impl Default for InMemoryMessageLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_IN_MEMORY_CAPACITY)
    }
}

impl InMemoryMessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` messages (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn messages(&self) -> MutexGuard<'_, VecDeque<ChatMessage>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns every retained message, oldest first.
    pub fn all(&self) -> Vec<ChatMessage> {
        self.messages().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages().is_empty()
    }
}

#[async_trait]
impl MessageLog for InMemoryMessageLog {
    async fn append(&self, message: &ChatMessage) -> Result<(), MessageLogError> {
        let mut messages = self.messages();
        // Appends land from independent tasks, so append order is not send order.
        let at = messages.partition_point(|m| m.sent_at() <= message.sent_at());
        messages.insert(at, message.clone());
        while messages.len() > self.capacity {
            messages.pop_front();
        }
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ChatMessage>, MessageLogError> {
        let messages = self.messages();
        let skip = messages.len().saturating_sub(limit);
        Ok(messages.iter().skip(skip).cloned().collect())
    }
}
