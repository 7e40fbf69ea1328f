//! WebSocket adapter - the relay's real-time transport.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ ws_handler: authenticate → upgrade → attach                  │
//! └──────────────────────────────────────────────────────────────┘
//!          │ inbound frames                  ▲ outbound queue
//!          ▼                                 │
//! ┌─────────────────────┐  deliver/   ┌─────────────────────────┐
//! │ ChatRelay           │────────────►│ ConnectionHub           │
//! │ join / send / leave │ deliver_all │ conn-1 → tx, conn-2 → tx│
//! └─────────────────────┘             └─────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - wire protocol types
//! - [`hub`] - live connection table, implements `ConnectionSink`
//! - [`handler`] - axum upgrade handler and per-socket loop

pub mod handler;
pub mod hub;
pub mod messages;

pub use handler::{websocket_router, ws_handler, ConnectParams, WebSocketState};
pub use hub::ConnectionHub;
pub use messages::{
    ClientMessage, ConnectedMessage, ErrorMessage, PongMessage, ReceiveMessage, ServerMessage,
    UserListMessage,
};
