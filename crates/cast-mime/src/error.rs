//! Errors raised while taking a message apart.

/// Result type alias for MIME parsing.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a message or part could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A header line is neither a field nor a continuation.
    #[error("Invalid MIME header: {0}")]
    InvalidHeader(String),

    /// `Content-Type` lacks a type or subtype.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// A base64 body does not decode.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// No blank line separates the header block from the body.
    #[error("Missing header/body separator")]
    MissingSeparator,

    /// A multipart entity has no boundary, or the boundary never appears.
    #[error("Multipart boundary missing or never found")]
    MissingBoundary,
}
