//! Mock session validator for tests and local development.
//!
//! # Example
//!
//! ```ignore
//! use chat_relay::adapters::auth::MockSessionValidator;
//! use chat_relay::domain::foundation::{AuthenticatedUser, UserId};
//!
//! let validator = MockSessionValidator::new()
//!     .with_user("valid-token", AuthenticatedUser::new(
//!         UserId::new("user-123").unwrap(),
//!         Some("test@example.com".to_string()),
//!         None,
//!     ));
//!
//! let result = validator.validate("valid-token").await;
//! assert!(result.is_ok());
//! ```

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId, ValidationError};
use crate::ports::SessionValidator;

/// Mock session validator.
///
/// Stores a map of tokens to outcomes. Tokens not in the map return
/// `InvalidToken`.
#[derive(Debug, Default, Clone)]
pub struct MockSessionValidator {
    tokens: HashMap<String, Result<AuthenticatedUser, AuthError>>,
    /// Returned for every token when set.
    force_error: Option<AuthError>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a valid token that maps to a user.
    pub fn with_user(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.tokens.insert(token.into(), Ok(user));
        self
    }

    /// Adds a valid token for a bare test user with the given ID.
    pub fn with_test_user(
        self,
        token: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let user_id = UserId::new(user_id)?;
        let email = format!("{}@test.example.com", user_id);
        Ok(self.with_user(token, AuthenticatedUser::new(user_id, Some(email), None)))
    }

    /// Makes one token fail with `error`.
    pub fn with_token_error(mut self, token: impl Into<String>, error: AuthError) -> Self {
        self.tokens.insert(token.into(), Err(error));
        self
    }

    /// Forces all validations to return the specified error.
    pub fn with_error(mut self, error: AuthError) -> Self {
        self.force_error = Some(error);
        self
    }

    /// Returns the number of registered tokens.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = &self.force_error {
            return Err(error.clone());
        }

        self.tokens
            .get(token)
            .cloned()
            .unwrap_or(Err(AuthError::InvalidToken))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(id: &str) -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new(id).unwrap(), None, None)
    }

    #[tokio::test]
    async fn known_token_returns_user() {
        let validator = MockSessionValidator::new().with_user("token-1", test_user("user-1"));

        let user = validator.validate("token-1").await.unwrap();
        assert_eq!(user.id.as_str(), "user-1");
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let validator = MockSessionValidator::new();
        assert_eq!(
            validator.validate("nope").await,
            Err(AuthError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn token_error_applies_to_that_token_only() {
        let validator = MockSessionValidator::new()
            .with_user("good", test_user("user-1"))
            .with_token_error("old", AuthError::TokenExpired);

        assert!(validator.validate("good").await.is_ok());
        assert_eq!(validator.validate("old").await, Err(AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn forced_error_overrides_every_token() {
        let validator = MockSessionValidator::new()
            .with_user("good", test_user("user-1"))
            .with_error(AuthError::service_unavailable("down"));

        assert!(matches!(
            validator.validate("good").await,
            Err(AuthError::ServiceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_user_gets_synthetic_email() {
        let validator = MockSessionValidator::new()
            .with_test_user("t", "user-9")
            .unwrap();

        let user = validator.validate("t").await.unwrap();
        assert_eq!(user.email.as_deref(), Some("user-9@test.example.com"));
        assert_eq!(validator.token_count(), 1);
    }

    #[test]
    fn test_user_rejects_empty_id() {
        assert!(MockSessionValidator::new().with_test_user("t", "").is_err());
    }
}
