//! Relay limits configuration

use serde::Deserialize;

use crate::application::RelayLimits;

use super::error::ValidationError;

/// Bounds on display names, message bodies and history reads
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_max_display_name_len")]
    pub max_display_name_len: usize,

    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,

    /// Entries returned by the history endpoint when no `limit` is given
    #[serde(default = "default_history_default_limit")]
    pub history_default_limit: usize,

    /// Hard cap on `limit` for the history endpoint
    #[serde(default = "default_history_max_limit")]
    pub history_max_limit: usize,
}

impl RelayConfig {
    /// Validate relay limits
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_display_name_len == 0 {
            return Err(ValidationError::ZeroLimit("max_display_name_len"));
        }
        if self.max_message_len == 0 {
            return Err(ValidationError::ZeroLimit("max_message_len"));
        }
        if self.history_max_limit == 0 {
            return Err(ValidationError::ZeroLimit("history_max_limit"));
        }
        if self.history_default_limit > self.history_max_limit {
            return Err(ValidationError::HistoryLimitOrder);
        }
        Ok(())
    }

    pub fn limits(&self) -> RelayLimits {
        RelayLimits {
            max_display_name_len: self.max_display_name_len,
            max_message_len: self.max_message_len,
            history_default_limit: self.history_default_limit,
            history_max_limit: self.history_max_limit,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_display_name_len: default_max_display_name_len(),
            max_message_len: default_max_message_len(),
            history_default_limit: default_history_default_limit(),
            history_max_limit: default_history_max_limit(),
        }
    }
}

fn default_max_display_name_len() -> usize {
    64
}

fn default_max_message_len() -> usize {
    4096
}

fn default_history_default_limit() -> usize {
    200
}

fn default_history_max_limit() -> usize {
    1000
}
