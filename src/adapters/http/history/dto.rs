//! Data transfer objects for the history endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::chat::ChatMessage;

/// Query parameters for listing messages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// One stored message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub user: String,
    pub text: String,
    pub to: Option<String>,
    pub created_at: String,
}

impl From<ChatMessage> for MessageResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id().to_string(),
            user: message.sender().to_string(),
            text: message.text().to_string(),
            to: message.recipient().map(ToString::to_string),
            created_at: message.sent_at().to_rfc3339(),
        }
    }
}
