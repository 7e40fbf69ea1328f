//! Authentication types for the domain layer.
//!
//! These types represent a caller whose credential token was accepted by the
//! auth collaborator. They carry no provider dependencies; any token scheme
//! can populate them via the `SessionValidator` port.
//!
//! The relay only needs to know that a connection was authenticated. The
//! display name a connection chats under is chosen at join time and is not
//! taken from these claims.

use super::UserId;
use thiserror::Error;

/// Authenticated caller extracted from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The account identifier from the auth collaborator.
    pub id: UserId,

    /// Email claim, if the token carried one.
    pub email: Option<String>,

    /// Display name claim, if the token carried one.
    pub display_name: Option<String>,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    pub fn new(id: UserId, email: Option<String>, display_name: Option<String>) -> Self {
        Self {
            id,
            email,
            display_name,
        }
    }

    /// Best label for log lines: display name, then email, then the id.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(self.id.as_str())
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No token was presented.
    #[error("Authentication required")]
    MissingToken,

    /// The token is malformed or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The authentication service is unavailable (network, config, etc.).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}
