//! Domain layer containing relay vocabulary and rules.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, errors, auth types)
//! - `chat` - Identities, chat messages and the per-connection lifecycle

pub mod chat;
pub mod foundation;
