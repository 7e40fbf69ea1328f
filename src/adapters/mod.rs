//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the relay core to external systems:
//! - `auth` - `SessionValidator` implementations (JWT, mock)
//! - `message_log` - `MessageLog` implementations (in-memory, PostgreSQL)
//! - `websocket` - real-time transport, `ConnectionSink` implementation
//! - `http` - history and health endpoints, auth middleware, app router

pub mod auth;
pub mod http;
pub mod message_log;
pub mod websocket;

pub use auth::{JwtSessionValidator, MockSessionValidator};
pub use http::{app_router, HttpOptions};
pub use message_log::{InMemoryMessageLog, PostgresMessageLog};
pub use websocket::{ConnectionHub, WebSocketState};
