//! WebSocket upgrade handler for chat connections.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Validate the credential token (before upgrade; failures never touch the registry)
//! 2. Upgrade to WebSocket and attach to the hub
//! 3. Feed inbound frames to the relay; a writer task drains the outbound queue
//! 4. On close, detach and run the disconnect path exactly once

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;

use crate::adapters::http::middleware::{auth_error_response, bearer_token};
use crate::application::{ChatRelay, SendCommand};
use crate::domain::chat::ConnectionSession;
use crate::domain::foundation::{AuthError, AuthenticatedUser, ConnectionId, DomainError, ErrorCode};
use crate::ports::SessionValidator;

use super::hub::ConnectionHub;
use super::messages::{ClientMessage, ServerMessage};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub relay: Arc<ChatRelay>,
    pub hub: Arc<ConnectionHub>,
    pub validator: Arc<dyn SessionValidator>,
}

impl WebSocketState {
    pub fn new(
        relay: Arc<ChatRelay>,
        hub: Arc<ConnectionHub>,
        validator: Arc<dyn SessionValidator>,
    ) -> Self {
        Self {
            relay,
            hub,
            validator,
        }
    }
}

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Browsers cannot set headers on websocket requests.
    pub token: Option<String>,
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
///
/// The token comes from `Authorization: Bearer` or the `token` query
/// parameter. Missing or rejected tokens get a 401 before any upgrade.
pub async fn ws_handler(
    State(state): State<WebSocketState>,
    Query(params): Query<ConnectParams>,
    headers: HeaderMap,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    let token = bearer_token(&headers)
        .map(str::to_owned)
        .or(params.token.filter(|t| !t.is_empty()));

    let Some(token) = token else {
        return auth_error_response(&AuthError::MissingToken);
    };

    let user = match state.validator.validate(&token).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Websocket auth rejected: {}", e);
            return auth_error_response(&e);
        }
    };

    let Some(ws) = ws else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Expected a websocket upgrade request",
                "code": "UPGRADE_REQUIRED"
            })),
        )
            .into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, user, state))
}

/// Runs for the lifetime of one accepted connection.
async fn handle_socket(socket: WebSocket, user: AuthenticatedUser, state: WebSocketState) {
    let connection_id = ConnectionId::new();
    let mut session = ConnectionSession::new(connection_id, user);
    let mut outbound = state.hub.attach(connection_id).await;

    tracing::info!(
        connection_id = %connection_id,
        user = session.user().label(),
        "Connection accepted"
    );
    state
        .hub
        .send_direct(&connection_id, ServerMessage::connected(connection_id))
        .await;

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            if let Err(e) = send_message(&mut sender, &msg).await {
                tracing::debug!(
                    connection_id = %connection_id,
                    "Send error, closing connection: {}",
                    e
                );
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut send_task => break,
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    handle_text(&state, &mut session, &text).await;
                }
                Some(Ok(Message::Binary(_))) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        "Received unsupported binary message"
                    );
                    reject(
                        &state,
                        &connection_id,
                        ErrorCode::InvalidEvent,
                        "Binary frames are not supported",
                    )
                    .await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::debug!(connection_id = %connection_id, "Client closed connection");
                    break;
                }
                // Protocol ping/pong is answered by axum.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(connection_id = %connection_id, "Receive error: {}", e);
                    break;
                }
            }
        }
    }

    send_task.abort();
    state.hub.detach(&connection_id).await;
    state.relay.disconnect(&mut session).await;
}

/// Apply one inbound text frame. Rejections go back to this connection only.
async fn handle_text(state: &WebSocketState, session: &mut ConnectionSession, text: &str) {
    let connection_id = session.id();

    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(connection_id = %connection_id, "Malformed frame discarded: {}", e);
            reject(state, &connection_id, ErrorCode::InvalidEvent, "Malformed event").await;
            return;
        }
    };

    match message {
        ClientMessage::Join { name } => {
            if let Err(e) = state.relay.join(session, name).await {
                tracing::warn!(connection_id = %connection_id, "Join rejected: {}", e);
                send_error(state, &connection_id, e.into()).await;
            }
        }
        ClientMessage::SendMessage { text, to } => {
            // Persistence is left to finish on its own.
            if let Err(e) = state.relay.send(session, SendCommand { text, to }).await {
                tracing::warn!(connection_id = %connection_id, "Send rejected: {}", e);
                send_error(state, &connection_id, e.into()).await;
            }
        }
        ClientMessage::Ping => {
            tracing::trace!(connection_id = %connection_id, "Received ping");
            state
                .hub
                .send_direct(&connection_id, ServerMessage::pong())
                .await;
        }
    }
}

async fn reject(
    state: &WebSocketState,
    connection_id: &ConnectionId,
    code: ErrorCode,
    message: &str,
) {
    send_error(state, connection_id, DomainError::new(code, message)).await;
}

async fn send_error(state: &WebSocketState, connection_id: &ConnectionId, err: DomainError) {
    state.hub.send_direct(connection_id, err.into()).await;
}

/// Send a JSON message over the WebSocket.
async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}
