//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Minimum accepted length for the HS256 signing secret in production.
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Authentication configuration (shared-secret JWT)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    /// HS256 signing secret shared with the token issuer
    pub jwt_secret: Option<SecretString>,

    /// Reject tokens without an `exp` claim
    #[serde(default)]
    pub require_exp: bool,
}

impl AuthConfig {
    /// True when a non-empty secret is configured.
    pub fn has_secret(&self) -> bool {
        self.jwt_secret
            .as_ref()
            .is_some_and(|s| !s.expose_secret().is_empty())
    }

    /// Validate authentication configuration
    ///
    /// Production requires a secret of reasonable length. Development without
    /// a secret falls back to the mock validator.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if *environment != Environment::Production {
            return Ok(());
        }
        match &self.jwt_secret {
            None => Err(ValidationError::MissingRequired("AUTH__JWT_SECRET")),
            Some(secret) if secret.expose_secret().len() < MIN_PRODUCTION_SECRET_LEN => {
                Err(ValidationError::WeakJwtSecret)
            }
            Some(_) => Ok(()),
        }
    }
}
