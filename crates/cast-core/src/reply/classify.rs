//! Auth-vs-transient classification of per-cycle failures.

use super::session::SessionError;

/// How the poll loop reacts to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Credentials rejected; stop now.
    Auth,
    /// Anything else; retry next cycle.
    Transient,
}

/// Substrings that mark an authentication failure in transport error text.
///
/// `(needle, case_sensitive)`. "LOGIN" stays case-sensitive so that a
/// hostname or path containing "login" is not mistaken for a rejection.
const AUTH_MARKERS: &[(&str, bool)] = &[("authentication", false), ("LOGIN", true)];

/// Classifies a failure. Only connection-phase errors can be auth failures;
/// unrecognised text is transient.
pub fn classify(error: &SessionError) -> Failure {
    let SessionError::Connect(source) = error else {
        return Failure::Transient;
    };
    match source {
        cast_imap::Error::Auth(_) => Failure::Auth,
        // Their text names the command, not the server's verdict.
        cast_imap::Error::Io(_) | cast_imap::Error::Timeout { .. } => Failure::Transient,
        other if matches_auth_marker(&other.to_string()) => Failure::Auth,
        _ => Failure::Transient,
    }
}

fn matches_auth_marker(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    AUTH_MARKERS.iter().any(|&(needle, case_sensitive)| {
        if case_sensitive {
            text.contains(needle)
        } else {
            lower.contains(needle)
        }
    })
}
