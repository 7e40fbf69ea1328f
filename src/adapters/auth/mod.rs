//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 shared-secret tokens
//! - `mock` - token map for tests and local development

mod jwt;
mod mock;

pub use jwt::{JwtSessionValidator, RelayClaims};
pub use mock::MockSessionValidator;
