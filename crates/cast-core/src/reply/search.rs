//! Correlation: which message in the folder is the reply.

use cast_imap::Uid;

use super::parse::parse_message;
use super::session::{HeaderQuery, MailboxSession, SessionError};
use super::{EmailResponse, WaitRequest};

/// First cycle on which the subject fallback may run.
pub const SUBJECT_FALLBACK_MIN_CYCLE: u32 = 2;

/// Correlation strategies, tried in [`SearchStrategy::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// `In-Reply-To` names the sent message.
    InReplyTo,
    /// `References` names the sent message.
    References,
    /// Subject matches and the envelope's `In-Reply-To` confirms it.
    SubjectFallback,
}

impl SearchStrategy {
    /// Per-cycle order; the first hit wins.
    pub const ORDER: [Self; 3] = [Self::InReplyTo, Self::References, Self::SubjectFallback];

    /// Header searched.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::InReplyTo => "In-Reply-To",
            Self::References => "References",
            Self::SubjectFallback => "Subject",
        }
    }

    /// Whether the strategy may run on `cycle` (1-based).
    #[must_use]
    pub fn eligible(self, cycle: u32, subject: &str) -> bool {
        match self {
            Self::SubjectFallback => {
                cycle >= SUBJECT_FALLBACK_MIN_CYCLE && !subject.trim().is_empty()
            }
            _ => true,
        }
    }

    fn query(self, request: &WaitRequest) -> HeaderQuery {
        let values = match self {
            Self::InReplyTo | Self::References => {
                let bare = bare_id(&request.message_id);
                vec![format!("<{bare}>"), bare.to_string()]
            }
            Self::SubjectFallback => {
                let subject = request.subject.trim();
                vec![
                    format!("Re: {subject}"),
                    format!("RE: {subject}"),
                    format!("re: {subject}"),
                    subject.to_string(),
                ]
            }
        };
        HeaderQuery::new(self.header(), values)
    }
}

/// Runs one cycle of correlation and, on a hit, fetches and parses the reply.
///
/// # Errors
///
/// Returns the session error of any failing search or fetch. "No reply
/// yet" is `Ok(None)`.
pub async fn find_reply<S: MailboxSession>(
    session: &mut S,
    request: &WaitRequest,
    cycle: u32,
) -> Result<Option<EmailResponse>, SessionError> {
    let Some((strategy, uid)) = correlate(session, request, cycle).await? else {
        return Ok(None);
    };
    tracing::info!(?strategy, %uid, cycle, "Reply correlated");

    let fetched = session
        .fetch_message(uid)
        .await?
        .ok_or(SessionError::Unreadable {
            uid: uid.get(),
            reason: "message vanished before fetch",
        })?;
    parse_message(&fetched, request.full_layout).map(Some)
}

async fn correlate<S: MailboxSession>(
    session: &mut S,
    request: &WaitRequest,
    cycle: u32,
) -> Result<Option<(SearchStrategy, Uid)>, SessionError> {
    for strategy in SearchStrategy::ORDER {
        if !strategy.eligible(cycle, &request.subject) {
            tracing::debug!(?strategy, cycle, "Strategy not eligible this cycle");
            continue;
        }

        let uids = session.search(&strategy.query(request)).await?;
        let hit = match strategy {
            // The server's header index is trusted: newest hit wins.
            SearchStrategy::InReplyTo | SearchStrategy::References => uids.into_iter().max(),
            SearchStrategy::SubjectFallback => {
                validate_newest_first(session, uids, &request.message_id).await?
            }
        };
        if let Some(uid) = hit {
            return Ok(Some((strategy, uid)));
        }
    }
    Ok(None)
}

/// First candidate, newest first, whose `In-Reply-To` names the target.
async fn validate_newest_first<S: MailboxSession>(
    session: &mut S,
    mut uids: Vec<Uid>,
    message_id: &str,
) -> Result<Option<Uid>, SessionError> {
    uids.sort_unstable();
    uids.dedup();

    for uid in uids.into_iter().rev() {
        let Some(envelope) = session.fetch_envelope(uid).await? else {
            continue;
        };
        if in_reply_to_matches(envelope.in_reply_to.as_deref(), message_id) {
            return Ok(Some(uid));
        }
        tracing::debug!(%uid, "Subject match rejected: In-Reply-To does not name the sent message");
    }
    Ok(None)
}

/// Message-ID without surrounding whitespace and angle brackets.
#[must_use]
pub fn bare_id(message_id: &str) -> &str {
    message_id
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim()
}

/// Whether an `In-Reply-To` value names `message_id`, ignoring brackets
/// and case. A missing or empty header never matches.
#[must_use]
pub fn in_reply_to_matches(header: Option<&str>, message_id: &str) -> bool {
    let target = bare_id(message_id).to_lowercase();
    let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
        return false;
    };
    !target.is_empty() && header.to_lowercase().contains(&target)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_id() {
        assert_eq!(bare_id("<cast-abc123@example.com>"), "cast-abc123@example.com");
        assert_eq!(bare_id("  cast-abc123@example.com "), "cast-abc123@example.com");
        assert_eq!(bare_id("<>"), "");
    }

    #[test]
    fn test_in_reply_to_matches() {
        let id = "<cast-abc123@example.com>";
        assert!(in_reply_to_matches(Some("cast-abc123@example.com"), id));
        assert!(in_reply_to_matches(Some("<CAST-ABC123@example.com>"), id));
        assert!(in_reply_to_matches(Some("<cast-abc123@example.com>"), "cast-abc123@example.com"));
        assert!(!in_reply_to_matches(Some("<other@example.com>"), id));
        assert!(!in_reply_to_matches(Some("  "), id));
        assert!(!in_reply_to_matches(None, id));
    }

    #[test]
    fn test_subject_fallback_gating() {
        let fallback = SearchStrategy::SubjectFallback;
        assert!(!fallback.eligible(1, "Deploy"));
        assert!(fallback.eligible(2, "Deploy"));
        assert!(!fallback.eligible(5, "   "));
        assert!(SearchStrategy::InReplyTo.eligible(1, ""));
    }

    #[test]
    fn test_queries() {
        let request = WaitRequest {
            message_id: "<id@x>".into(),
            subject: " Deploy ".into(),
            deadline_minutes: 1,
            full_layout: false,
            poll_interval_seconds: 5,
        };
        let query = SearchStrategy::References.query(&request);
        assert_eq!(query.field, "References");
        assert_eq!(query.values, vec!["<id@x>", "id@x"]);

        let query = SearchStrategy::SubjectFallback.query(&request);
        assert_eq!(
            query.values,
            vec!["Re: Deploy", "RE: Deploy", "re: Deploy", "Deploy"]
        );
    }
}
