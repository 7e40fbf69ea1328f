//! Session validation port - the auth collaborator.
//!
//! Given the credential token a client presents when it opens a connection,
//! returns the verified caller or fails the attempt before the connection
//! can reach the Joined state. Token format, signing and expiry policy are
//! the implementation's business.
//!
//! # Example Implementation
//!
//! ```ignore
//! pub struct JwtSessionValidator { ... }
//!
//! #[async_trait]
//! impl SessionValidator for JwtSessionValidator {
//!     async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
//!         // 1. Verify signature with the shared secret
//!         // 2. Check exp if present
//!         // 3. Map claims to AuthenticatedUser
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates access tokens and extracts the caller.
///
/// # Contract
///
/// Implementations must:
/// - Return `AuthError::InvalidToken` for malformed or badly signed tokens
/// - Return `AuthError::TokenExpired` for expired tokens
/// - Return `AuthError::ServiceUnavailable` for transient errors
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a raw token (without any "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
