//! Chat domain - identities, messages and connection lifecycle.

mod identity;
mod lifecycle;
mod message;

pub use identity::{Identity, DEFAULT_MAX_IDENTITY_LEN};
pub use lifecycle::{ConnectionPhase, ConnectionSession};
pub use message::{ChatMessage, Delivery, DEFAULT_MAX_TEXT_LEN};
