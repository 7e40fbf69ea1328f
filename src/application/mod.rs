//! Application layer - the relay core.
//!
//! Orchestrates the domain types over the ports. Every component shares one
//! `IdentityRegistry`; `ChatRelay` is what transports talk to.

mod lifecycle;
mod presence;
mod registry;
mod relay;
mod router;

pub use lifecycle::{JoinError, LifecycleManager};
pub use presence::PresenceBroadcaster;
pub use registry::{IdentityRegistry, Registration, Unregistration};
pub use relay::{ChatRelay, RelayLimits};
pub use router::{Dispatch, MessageRouter, RouteError, RouteReport, SendCommand};
