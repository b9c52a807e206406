//! Error types for the reply-correlation engine.

use thiserror::Error;

/// Terminal outcomes of a wait that did not produce a reply.
#[derive(Debug, Error)]
pub enum WaitError {
    /// IMAP settings are incomplete; no connection was attempted.
    #[error("IMAP configuration incomplete: missing {0}")]
    ConfigMissing(String),

    /// The requested wait is longer than the configured ceiling.
    #[error("Requested wait of {requested} minutes exceeds the configured maximum of {max} minutes")]
    ExceedsMaxWait {
        /// Minutes requested.
        requested: u32,
        /// Configured ceiling.
        max: u32,
    },

    /// The server rejected the credentials. Never retried.
    #[error("IMAP authentication failed: {0}")]
    AuthFailure(String),

    /// The deadline passed without a correlated reply.
    #[error("No reply received within {minutes} minutes")]
    Timeout {
        /// Minutes waited.
        minutes: u32,
    },
}

impl WaitError {
    /// Process exit status for this outcome.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigMissing(_) | Self::ExceedsMaxWait { .. } => 2,
            Self::Timeout { .. } => 3,
            Self::AuthFailure(_) => 4,
        }
    }
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Malformed JSON or wrong field types.
    #[error("Invalid configuration: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for waits.
pub type Result<T> = std::result::Result<T, WaitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(WaitError::ConfigMissing("imap_host".into()).exit_code(), 2);
        assert_eq!(
            WaitError::ExceedsMaxWait {
                requested: 200,
                max: 120
            }
            .exit_code(),
            2
        );
        assert_eq!(WaitError::Timeout { minutes: 5 }.exit_code(), 3);
        assert_eq!(WaitError::AuthFailure("bad".into()).exit_code(), 4);
    }

    #[test]
    fn test_display() {
        let err = WaitError::ExceedsMaxWait {
            requested: 200,
            max: 120,
        };
        assert_eq!(
            err.to_string(),
            "Requested wait of 200 minutes exceeds the configured maximum of 120 minutes"
        );
    }
}
