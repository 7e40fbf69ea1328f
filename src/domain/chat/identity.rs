//! Identity value object - the display name a connection chats under.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Default upper bound on display name length, in characters.
pub const DEFAULT_MAX_IDENTITY_LEN: usize = 64;

/// Display name a connection is known by after a successful join.
///
/// Unique only among simultaneously joined connections, and only by virtue
/// of the registry's last-join-wins rule. Comparison is exact (case
/// sensitive, no trimming).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Creates an identity with the default length bound.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        Self::parse(name, DEFAULT_MAX_IDENTITY_LEN)
    }

    /// Creates an identity, rejecting blank names, control characters and
    /// names longer than `max_len` characters.
    pub fn parse(name: impl Into<String>, max_len: usize) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        let len = name.chars().count();
        if len > max_len {
            return Err(ValidationError::too_long("name", max_len, len));
        }
        if name.chars().any(char::is_control) {
            return Err(ValidationError::invalid_format(
                "name",
                "control characters are not allowed",
            ));
        }
        Ok(Self(name))
    }

    /// Returns the display name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identity, returning the display name.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
