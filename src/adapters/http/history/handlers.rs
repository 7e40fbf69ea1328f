//! HTTP handlers for message history.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::middleware::RequireAuth;
use crate::application::ChatRelay;
use crate::ports::MessageLogError;

use super::dto::{HistoryQuery, MessageResponse};

/// GET /api/messages - Most recent stored messages, oldest first
///
/// Any authenticated caller sees the whole log, direct messages included.
/// Tokens carry a user ID while messages are addressed by display name, so
/// there is nothing to filter a caller's own conversations by.
pub async fn list_messages(
    State(relay): State<Arc<ChatRelay>>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MessageResponse>>, HistoryApiError> {
    tracing::debug!(user_id = %user.id, limit = ?query.limit, "History requested");

    let messages = relay.history(query.limit).await?;

    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

/// API error wrapper for history endpoints.
#[derive(Debug)]
pub struct HistoryApiError(MessageLogError);

impl From<MessageLogError> for HistoryApiError {
    fn from(err: MessageLogError) -> Self {
        Self(err)
    }
}

impl IntoResponse for HistoryApiError {
    fn into_response(self) -> Response {
        tracing::error!("History read failed: {}", self.0);

        let (status, code) = match &self.0 {
            MessageLogError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
            MessageLogError::Database(_) | MessageLogError::Corrupt(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
        };

        (
            status,
            Json(serde_json::json!({
                "error": "Failed to load message history",
                "code": code
            })),
        )
            .into_response()
    }
}
