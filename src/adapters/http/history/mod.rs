//! HTTP adapter for the read-only message history.

mod dto;
mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::application::ChatRelay;

pub use dto::{HistoryQuery, MessageResponse};
pub use handlers::{list_messages, HistoryApiError};

/// Create the history API router.
///
/// # Routes
/// - `GET /messages` - Most recent messages (requires authentication)
pub fn history_routes() -> Router<Arc<ChatRelay>> {
    Router::new().route("/messages", get(list_messages))
}
