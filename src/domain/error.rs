//! # Domain Errors
//!
//! Error taxonomy shared by the command path, the broadcast loops and the settings store.

use std::time::Duration;
use thiserror::Error;

/// Errors a command handler can answer with. Every variant becomes a short reply to the owner.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Bad arguments. Nothing was changed.
    #[error("⚠️ {0}")]
    Validation(String),

    /// The reply rule or broadcast does not exist. Nothing was changed.
    #[error("❌ {0}")]
    NotFound(String),

    #[error("❓ Unknown command `{0}`.")]
    UnknownVerb(String),
}

impl CommandError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

/// Outcome of a failed delivery, as classified by the transport adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// Rate limiting or network trouble. Worth retrying after `retry_after` (or a default backoff).
    #[error("transient delivery failure: {reason}")]
    Transient {
        reason: String,
        retry_after: Option<Duration>,
    },

    /// Permission denied, banned, unknown target. Retrying will not help.
    #[error("permanent delivery failure: {reason}")]
    Permanent { reason: String },
}

impl DeliveryError {
    pub fn transient(reason: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::Transient {
            reason: reason.into(),
            retry_after,
        }
    }

    pub fn permanent(reason: impl Into<String>) -> Self {
        Self::Permanent {
            reason: reason.into(),
        }
    }
}

/// The settings store could not read or write a value.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[cfg(feature = "redis")]
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("{0}")]
    Unavailable(String),
}
