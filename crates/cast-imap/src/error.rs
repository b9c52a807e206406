//! Client errors.

use std::time::Duration;

use thiserror::Error;

use crate::parser::Status;

/// Everything that can go wrong talking to the server.
#[derive(Debug, Error)]
pub enum Error {
    /// Socket failure, including the server closing the connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake failed.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// The host is not usable as a TLS server name.
    #[error("Invalid TLS server name: {0}")]
    ServerName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// A response did not follow the IMAP grammar.
    #[error("Malformed response at byte {offset}: {reason}")]
    Malformed {
        /// Offset into the response.
        offset: usize,
        /// What was expected.
        reason: String,
    },

    /// LOGIN was refused or is disabled.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The server answered NO or BAD.
    #[error("{command} failed with {status}: {text}")]
    Refused {
        /// Command name.
        command: &'static str,
        /// `NO` or `BAD`.
        status: Status,
        /// Server text.
        text: String,
    },

    /// The server ended the session.
    #[error("Server closed the session: {0}")]
    Bye(String),

    /// An exchange did not finish in time.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// What was running.
        operation: &'static str,
        /// The deadline that passed.
        after: Duration,
    },

    /// The server did something this client cannot follow.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Whether the server rejected the credentials.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
