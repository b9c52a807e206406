//! Outbound Message-ID generation.
//!
//! Replies are correlated on the Message-ID we stamp on the notification,
//! so it must be unique and carry the sender's domain.

use chrono::Utc;
use rand::Rng;

/// Domain used when the sender address has none.
pub const FALLBACK_DOMAIN: &str = "cast.local";

/// Generates `<cast-{unix_nanos}-{16 hex}@{domain}>`.
#[must_use]
pub fn generate_message_id(domain: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let random: u64 = rand::thread_rng().r#gen();
    format!("<cast-{nanos}-{random:016x}@{domain}>")
}

/// Returns the part after the last `@`, or [`FALLBACK_DOMAIN`].
#[must_use]
pub fn extract_domain(email: &str) -> &str {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim().trim_end_matches('>'))
        .filter(|domain| !domain.is_empty())
        .unwrap_or(FALLBACK_DOMAIN)
}

/// Generates a Message-ID bound to the domain of `from`.
#[must_use]
pub fn message_id_for_sender(from: &str) -> String {
    generate_message_id(extract_domain(from))
}
