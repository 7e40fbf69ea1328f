//! Shared-secret JWT adapter for the `SessionValidator` port.
//!
//! Validates HS256 tokens signed with the relay's secret and maps their
//! claims to `AuthenticatedUser`. The subject may arrive as `sub` or `id`.
//! Expiry is checked when present and only required if configured.
//!
//! # Example
//!
//! ```ignore
//! use secrecy::SecretString;
//! use chat_relay::adapters::auth::JwtSessionValidator;
//!
//! let validator = JwtSessionValidator::new(SecretString::new("s3cret".into()), false);
//! let user = validator.validate("eyJ...").await?;
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Claims accepted in relay tokens.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RelayClaims {
    /// Subject - the user ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Legacy subject field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Expiry timestamp (Unix epoch seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl RelayClaims {
    fn into_user(self) -> Result<AuthenticatedUser, AuthError> {
        let subject = self.sub.or(self.id).ok_or_else(|| {
            tracing::warn!("Token has neither 'sub' nor 'id' claim");
            AuthError::InvalidToken
        })?;
        let id = UserId::new(subject).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthenticatedUser::new(id, self.email, self.name))
    }
}

/// HS256 session validator.
pub struct JwtSessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    pub fn new(secret: SecretString, require_exp: bool) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.expose_secret().as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        if require_exp {
            validation.set_required_spec_claims(&["exp"]);
        } else {
            validation.set_required_spec_claims::<&str>(&[]);
        }

        Self {
            decoding_key,
            validation,
        }
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<RelayClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                _ => {
                    tracing::warn!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            },
        )?;

        data.claims.into_user()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn sign(claims: &RelayClaims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn validator(require_exp: bool) -> JwtSessionValidator {
        JwtSessionValidator::new(SecretString::new(SECRET.to_string()), require_exp)
    }

    #[tokio::test]
    async fn accepts_token_with_legacy_id_and_no_expiry() {
        let token = sign(
            &RelayClaims {
                id: Some("64f0c2".to_string()),
                email: Some("alice@example.com".to_string()),
                ..Default::default()
            },
            SECRET,
        );

        let user = validator(false).validate(&token).await.unwrap();

        assert_eq!(user.id.as_str(), "64f0c2");
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn prefers_sub_over_id() {
        let token = sign(
            &RelayClaims {
                sub: Some("sub-1".to_string()),
                id: Some("id-1".to_string()),
                name: Some("Alice".to_string()),
                ..Default::default()
            },
            SECRET,
        );

        let user = validator(false).validate(&token).await.unwrap();

        assert_eq!(user.id.as_str(), "sub-1");
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn rejects_wrong_signature() {
        let token = sign(
            &RelayClaims {
                sub: Some("u".to_string()),
                ..Default::default()
            },
            "other-secret",
        );

        assert_eq!(
            validator(false).validate(&token).await,
            Err(AuthError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn rejects_garbage() {
        assert_eq!(
            validator(false).validate("not-a-jwt").await,
            Err(AuthError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn rejects_token_without_subject() {
        let token = sign(
            &RelayClaims {
                email: Some("a@b.c".to_string()),
                ..Default::default()
            },
            SECRET,
        );

        assert_eq!(
            validator(false).validate(&token).await,
            Err(AuthError::InvalidToken)
        );
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let token = sign(
            &RelayClaims {
                sub: Some("u".to_string()),
                exp: Some(Utc::now().timestamp() - 3600),
                ..Default::default()
            },
            SECRET,
        );

        assert_eq!(
            validator(false).validate(&token).await,
            Err(AuthError::TokenExpired)
        );
    }

    #[tokio::test]
    async fn require_exp_rejects_tokens_without_expiry() {
        let token = sign(
            &RelayClaims {
                sub: Some("u".to_string()),
                ..Default::default()
            },
            SECRET,
        );

        assert_eq!(
            validator(true).validate(&token).await,
            Err(AuthError::InvalidToken)
        );

        let token = sign(
            &RelayClaims {
                sub: Some("u".to_string()),
                exp: Some(Utc::now().timestamp() + 3600),
                ..Default::default()
            },
            SECRET,
        );
        assert!(validator(true).validate(&token).await.is_ok());
    }
}
