//! Chat Relay - presence-aware real-time chat over WebSockets
//!
//! Authenticated clients join under a display name, exchange group and
//! direct messages, and receive the roster of joined names whenever it
//! changes. Messages are appended to a log that backs a history endpoint.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
