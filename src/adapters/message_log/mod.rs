//! Message log adapters.
//!
//! - `in_memory` - process-local log, the default
//! - `postgres` - durable log backed by PostgreSQL

mod in_memory;
mod postgres;

pub use in_memory::{InMemoryMessageLog, DEFAULT_IN_MEMORY_CAPACITY};
pub use postgres::PostgresMessageLog;
