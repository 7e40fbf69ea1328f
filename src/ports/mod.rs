//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the relay core and the outside world. Adapters implement these ports.
//!
//! - `SessionValidator` - auth collaborator, consulted before a socket upgrade
//! - `MessageLog` - durable-log collaborator, fire-and-forget appends
//! - `ConnectionSink` - outbound delivery to live transport connections

mod connection_sink;
mod message_log;
mod session_validator;

pub use connection_sink::{ConnectionSink, OutboundEvent};
pub use message_log::{MessageLog, MessageLogError};
pub use session_validator::SessionValidator;
