//! Chat message value object.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MessageId, Timestamp, ValidationError};

use super::Identity;

/// Default upper bound on message text length, in characters.
pub const DEFAULT_MAX_TEXT_LEN: usize = 4096;

/// How a message is fanned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery<'a> {
    /// No recipient: every live connection gets a copy, sender included.
    Broadcast,
    /// One recipient identity, echoed back to the sender.
    Direct(&'a Identity),
}

/// An immutable chat message.
///
/// Built by the router when a send event arrives from a joined connection,
/// then handed independently to the durable log and to dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    id: MessageId,
    sender: Identity,
    text: String,
    recipient: Option<Identity>,
    sent_at: Timestamp,
}

impl ChatMessage {
    /// Creates a message stamped with the current time.
    pub fn new(
        sender: Identity,
        text: impl Into<String>,
        recipient: Option<Identity>,
        max_text_len: usize,
    ) -> Result<Self, ValidationError> {
        let text = validate_text(text.into(), max_text_len)?;
        Ok(Self {
            id: MessageId::new(),
            sender,
            text,
            recipient,
            sent_at: Timestamp::now(),
        })
    }

    /// Reconstitutes a stored message without re-validating it.
    pub fn restore(
        id: MessageId,
        sender: Identity,
        text: String,
        recipient: Option<Identity>,
        sent_at: Timestamp,
    ) -> Self {
        Self {
            id,
            sender,
            text,
            recipient,
            sent_at,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn sender(&self) -> &Identity {
        &self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn recipient(&self) -> Option<&Identity> {
        self.recipient.as_ref()
    }

    pub fn sent_at(&self) -> Timestamp {
        self.sent_at
    }

    /// Classifies the message as broadcast or direct.
    pub fn delivery(&self) -> Delivery<'_> {
        match &self.recipient {
            None => Delivery::Broadcast,
            Some(recipient) => Delivery::Direct(recipient),
        }
    }
}

fn validate_text(text: String, max_len: usize) -> Result<String, ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::empty_field("text"));
    }
    let len = text.chars().count();
    if len > max_len {
        return Err(ValidationError::too_long("text", max_len, len));
    }
    Ok(text)
}
