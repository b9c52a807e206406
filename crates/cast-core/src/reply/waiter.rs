//! The deadline-bounded poll loop.

use tokio::time::Instant;

use super::classify::{Failure, classify};
use super::present::format_duration;
use super::search::{bare_id, find_reply};
use super::session::{Connector, ImapConnector, MailboxSession, SessionError};
use super::{EmailResponse, WaitRequest};
use crate::config::EmailConfig;
use crate::error::{Result, WaitError};

/// Waits for a reply by polling the mailbox until a deadline.
///
/// Every cycle opens a fresh session, searches, and logs out again on every
/// path. The first cycle runs immediately; later ones follow the poll
/// interval, with the last sleep cut short at the deadline.
#[derive(Debug)]
pub struct ReplyWaiter<C = ImapConnector> {
    connector: C,
    config: EmailConfig,
}

impl ReplyWaiter<ImapConnector> {
    /// Creates a waiter that polls the IMAP server named in `config`.
    #[must_use]
    pub fn new(config: &EmailConfig) -> Self {
        Self::with_connector(config, ImapConnector::new(config))
    }
}

impl<C: Connector> ReplyWaiter<C> {
    /// Creates a waiter over a custom connector.
    pub fn with_connector(config: &EmailConfig, connector: C) -> Self {
        Self {
            connector,
            config: config.clone().with_defaults(),
        }
    }

    /// Waits for the reply described by `request`.
    ///
    /// Returns `Ok(None)` without touching the network when the request
    /// asks for a zero-minute wait.
    ///
    /// # Errors
    ///
    /// - [`WaitError::ConfigMissing`] if IMAP settings or the Message-ID are
    ///   missing
    /// - [`WaitError::ExceedsMaxWait`] if the wait is over the configured
    ///   ceiling
    /// - [`WaitError::AuthFailure`] as soon as the server rejects the login
    /// - [`WaitError::Timeout`] if no reply arrives before the deadline
    pub async fn wait(&self, request: &WaitRequest) -> Result<Option<EmailResponse>> {
        self.check(request)?;
        if request.deadline_minutes == 0 {
            tracing::debug!("Zero-minute wait, not polling");
            return Ok(None);
        }

        let poll = request.poll_interval();
        let started = Instant::now();
        let deadline = started + request.deadline();
        tracing::info!(
            message_id = %request.message_id,
            minutes = request.deadline_minutes,
            poll_seconds = poll.as_secs(),
            "Waiting for reply"
        );

        let mut cycle = 0u32;
        while Instant::now() < deadline {
            cycle += 1;
            match self.run_cycle(request, cycle).await {
                Ok(Some(response)) => {
                    tracing::info!(
                        cycle,
                        elapsed = %format_duration(started.elapsed()),
                        from = %response.from,
                        "Reply received"
                    );
                    return Ok(Some(response));
                }
                Ok(None) => tracing::debug!(cycle, "No reply yet"),
                Err(error) => match classify(&error) {
                    Failure::Auth => {
                        tracing::error!(cycle, %error, "Authentication rejected");
                        return Err(WaitError::AuthFailure(detail(&error)));
                    }
                    Failure::Transient => {
                        tracing::warn!(cycle, %error, "Poll cycle failed, retrying");
                    }
                },
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(poll.min(remaining)).await;
        }

        tracing::info!(cycles = cycle, "Deadline reached without a reply");
        Err(WaitError::Timeout {
            minutes: request.deadline_minutes,
        })
    }

    fn check(&self, request: &WaitRequest) -> Result<()> {
        let missing = self.config.missing_fields();
        if !missing.is_empty() {
            return Err(WaitError::ConfigMissing(missing.join(", ")));
        }
        if bare_id(&request.message_id).is_empty() {
            return Err(WaitError::ConfigMissing("message id".into()));
        }
        let max = self.config.wait_for_response_max_minutes;
        if max > 0 && request.deadline_minutes > max {
            return Err(WaitError::ExceedsMaxWait {
                requested: request.deadline_minutes,
                max,
            });
        }
        Ok(())
    }

    async fn run_cycle(
        &self,
        request: &WaitRequest,
        cycle: u32,
    ) -> std::result::Result<Option<EmailResponse>, SessionError> {
        let mut session = self.connector.open().await?;
        let result = find_reply(&mut session, request, cycle).await;
        session.logout().await;
        result
    }
}

fn detail(error: &SessionError) -> String {
    match error {
        SessionError::Connect(source) => source.to_string(),
        other => other.to_string(),
    }
}

/// Waits for a reply over IMAP using `config`.
///
/// # Errors
///
/// See [`ReplyWaiter::wait`].
pub async fn wait_for_reply(
    config: &EmailConfig,
    request: &WaitRequest,
) -> Result<Option<EmailResponse>> {
    ReplyWaiter::new(config).wait(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::reply::session::{FetchedMessage, HeaderQuery};
    use cast_imap::{Address, Envelope, Uid};
    use std::collections::VecDeque;
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const MESSAGE_ID: &str = "<cast-abc123@example.com>";

    #[derive(Clone)]
    struct StoredReply {
        uid: u32,
        /// Headers visible to SEARCH.
        headers: Vec<(&'static str, String)>,
        envelope: Envelope,
        raw: Vec<u8>,
        /// First connection attempt on which the reply is in the folder.
        arrives_on: u32,
    }

    impl StoredReply {
        fn new(uid: u32, in_reply_to: Option<&str>, subject: &str) -> Self {
            let mut headers = vec![("Subject", subject.to_string())];
            if let Some(value) = in_reply_to {
                headers.push(("In-Reply-To", value.to_string()));
            }
            Self {
                uid,
                headers,
                envelope: Envelope {
                    subject: Some(subject.into()),
                    from: vec![Address {
                        name: None,
                        mailbox: Some("jane".into()),
                        host: Some("example.com".into()),
                    }],
                    in_reply_to: in_reply_to.map(Into::into),
                    ..Envelope::default()
                },
                raw: format!("Subject: {subject}\r\n\r\nReply {uid}").into_bytes(),
                arrives_on: 1,
            }
        }

        /// Hides `In-Reply-To` from SEARCH while keeping it in the envelope.
        fn unindexed(mut self) -> Self {
            self.headers.retain(|(name, _)| *name != "In-Reply-To");
            self
        }

        fn arriving_on(mut self, attempt: u32) -> Self {
            self.arrives_on = attempt;
            self
        }
    }

    #[derive(Default)]
    struct Log {
        attempts: u32,
        opened: u32,
        logouts: u32,
        searches: Vec<(u32, &'static str)>,
        envelope_fetches: Vec<u32>,
    }

    #[derive(Clone, Default)]
    struct MockConnector {
        replies: Vec<StoredReply>,
        open_failures: Arc<Mutex<VecDeque<cast_imap::Error>>>,
        failing_searches: Arc<Mutex<u32>>,
        log: Arc<Mutex<Log>>,
    }

    impl MockConnector {
        fn with_replies(replies: Vec<StoredReply>) -> Self {
            Self {
                replies,
                ..Self::default()
            }
        }

        fn fail_opens(self, errors: Vec<cast_imap::Error>) -> Self {
            *self.open_failures.lock().unwrap() = errors.into();
            self
        }

        fn fail_searches(self, count: u32) -> Self {
            *self.failing_searches.lock().unwrap() = count;
            self
        }
    }

    struct MockSession {
        cycle: u32,
        replies: Vec<StoredReply>,
        failing_searches: Arc<Mutex<u32>>,
        log: Arc<Mutex<Log>>,
    }

    impl Connector for MockConnector {
        type Session = MockSession;

        async fn open(&self) -> std::result::Result<MockSession, SessionError> {
            let mut log = self.log.lock().unwrap();
            log.attempts += 1;
            if let Some(error) = self.open_failures.lock().unwrap().pop_front() {
                return Err(SessionError::Connect(error));
            }
            log.opened += 1;
            let attempt = log.attempts;
            Ok(MockSession {
                cycle: attempt,
                replies: self
                    .replies
                    .iter()
                    .filter(|reply| reply.arrives_on <= attempt)
                    .cloned()
                    .collect(),
                failing_searches: Arc::clone(&self.failing_searches),
                log: Arc::clone(&self.log),
            })
        }
    }

    impl MockSession {
        fn find(&self, uid: Uid) -> Option<&StoredReply> {
            self.replies.iter().find(|reply| reply.uid == uid.get())
        }
    }

    impl MailboxSession for MockSession {
        async fn search(
            &mut self,
            query: &HeaderQuery,
        ) -> std::result::Result<Vec<Uid>, SessionError> {
            self.log.lock().unwrap().searches.push((self.cycle, query.field));
            {
                let mut failing = self.failing_searches.lock().unwrap();
                if *failing > 0 {
                    *failing -= 1;
                    return Err(SessionError::Operation(cast_imap::Error::Bye(
                        "server shutting down".into(),
                    )));
                }
            }

            let matches = |reply: &StoredReply| {
                reply.headers.iter().any(|(name, value)| {
                    name.eq_ignore_ascii_case(query.field)
                        && query
                            .values
                            .iter()
                            .any(|v| value.to_lowercase().contains(&v.to_lowercase()))
                })
            };
            Ok(self
                .replies
                .iter()
                .filter(|reply| matches(*reply))
                .filter_map(|reply| Uid::new(reply.uid))
                .collect())
        }

        async fn fetch_envelope(
            &mut self,
            uid: Uid,
        ) -> std::result::Result<Option<Envelope>, SessionError> {
            self.log.lock().unwrap().envelope_fetches.push(uid.get());
            Ok(self.find(uid).map(|reply| reply.envelope.clone()))
        }

        async fn fetch_message(
            &mut self,
            uid: Uid,
        ) -> std::result::Result<Option<FetchedMessage>, SessionError> {
            Ok(self.find(uid).map(|reply| FetchedMessage {
                uid,
                envelope: Some(reply.envelope.clone()),
                sections: vec![(None, reply.raw.clone())],
            }))
        }

        async fn logout(self) {
            self.log.lock().unwrap().logouts += 1;
        }
    }

    fn config() -> EmailConfig {
        EmailConfig {
            imap_host: "imap.example.com".into(),
            imap_username: "cast".into(),
            imap_password: "secret".into(),
            ..EmailConfig::default()
        }
    }

    fn request(minutes: u32) -> WaitRequest {
        WaitRequest::new(&config(), MESSAGE_ID, "Deploy approval", minutes)
    }

    #[tokio::test]
    async fn test_zero_minutes_opens_nothing() {
        let connector = MockConnector::default();
        let waiter = ReplyWaiter::with_connector(&config(), connector.clone());

        assert!(waiter.wait(&request(0)).await.unwrap().is_none());
        assert_eq!(connector.log.lock().unwrap().attempts, 0);
    }

    #[tokio::test]
    async fn test_exceeds_max_opens_nothing() {
        let connector = MockConnector::default();
        let waiter = ReplyWaiter::with_connector(&config(), connector.clone());

        let err = waiter.wait(&request(121)).await.unwrap_err();
        assert!(matches!(
            err,
            WaitError::ExceedsMaxWait {
                requested: 121,
                max: 120
            }
        ));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(connector.log.lock().unwrap().attempts, 0);
    }

    #[tokio::test]
    async fn test_missing_host_opens_nothing() {
        let connector = MockConnector::default();
        let mut incomplete = config();
        incomplete.imap_host.clear();
        let waiter = ReplyWaiter::with_connector(&incomplete, connector.clone());

        let err = waiter.wait(&request(5)).await.unwrap_err();
        let WaitError::ConfigMissing(fields) = &err else {
            panic!("Expected ConfigMissing, got {err:?}");
        };
        assert!(fields.contains("imap_host"));
        assert_eq!(connector.log.lock().unwrap().attempts, 0);
    }

    #[tokio::test]
    async fn test_missing_config_checked_before_zero_minutes() {
        let waiter = ReplyWaiter::with_connector(&EmailConfig::default(), MockConnector::default());
        let err = waiter.wait(&request(0)).await.unwrap_err();
        assert!(matches!(err, WaitError::ConfigMissing(_)));
    }

    #[tokio::test]
    async fn test_empty_message_id_rejected() {
        let waiter = ReplyWaiter::with_connector(&config(), MockConnector::default());
        let mut request = request(5);
        request.message_id = " <> ".into();
        let err = waiter.wait(&request).await.unwrap_err();
        assert!(matches!(err, WaitError::ConfigMissing(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_is_immediate() {
        let connector = MockConnector::default().fail_opens(vec![cast_imap::Error::Auth(
            "Invalid credentials".into(),
        )]);
        let waiter = ReplyWaiter::with_connector(&config(), connector.clone());
        let started = Instant::now();

        let err = waiter.wait(&request(5)).await.unwrap_err();
        assert!(matches!(&err, WaitError::AuthFailure(text) if text.contains("Invalid credentials")));
        assert_eq!(err.exit_code(), 4);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(connector.log.lock().unwrap().attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let refused = || {
            cast_imap::Error::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))
        };
        let connector = MockConnector::with_replies(vec![StoredReply::new(
            4,
            Some(MESSAGE_ID),
            "Re: Deploy approval",
        )])
        .fail_opens(vec![refused(), refused()]);
        let waiter = ReplyWaiter::with_connector(&config(), connector.clone());
        let started = Instant::now();

        let reply = waiter.wait(&request(1)).await.unwrap().unwrap();
        assert_eq!(reply.body, "Reply 4");
        assert_eq!(started.elapsed(), Duration::from_secs(10));

        let log = connector.log.lock().unwrap();
        assert_eq!(log.attempts, 3);
        assert_eq!(log.opened, 1);
        assert_eq!(log.logouts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_failure_still_logs_out() {
        let connector = MockConnector::with_replies(vec![StoredReply::new(
            4,
            Some(MESSAGE_ID),
            "Re: Deploy approval",
        )])
        .fail_searches(1);
        let waiter = ReplyWaiter::with_connector(&config(), connector.clone());

        assert!(waiter.wait(&request(1)).await.unwrap().is_some());
        let log = connector.log.lock().unwrap();
        assert_eq!(log.opened, 2);
        assert_eq!(log.logouts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_mailbox_times_out_at_deadline() {
        let connector = MockConnector::default();
        let waiter = ReplyWaiter::with_connector(&config(), connector.clone());
        let started = Instant::now();

        let err = waiter.wait(&request(1)).await.unwrap_err();
        assert!(matches!(err, WaitError::Timeout { minutes: 1 }));
        assert_eq!(err.exit_code(), 3);

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(60));
        assert!(elapsed <= Duration::from_secs(65));

        let log = connector.log.lock().unwrap();
        assert_eq!(log.attempts, 12);
        assert_eq!(log.opened, log.logouts);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_sleep_clamped_to_deadline() {
        let connector = MockConnector::default();
        let waiter = ReplyWaiter::with_connector(&config(), connector.clone());
        let mut request = request(1);
        request.poll_interval_seconds = 45;
        let started = Instant::now();

        assert!(waiter.wait(&request).await.is_err());
        assert_eq!(started.elapsed(), Duration::from_secs(60));
        assert_eq!(connector.log.lock().unwrap().attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_has_no_sleep() {
        let connector = MockConnector::with_replies(vec![StoredReply::new(
            9,
            Some(MESSAGE_ID),
            "Re: Deploy approval",
        )]);
        let waiter = ReplyWaiter::with_connector(&config(), connector);
        let started = Instant::now();

        assert!(waiter.wait(&request(1)).await.unwrap().is_some());
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bare_in_reply_to_matches() {
        let connector = MockConnector::with_replies(vec![StoredReply::new(
            3,
            Some("cast-abc123@example.com"),
            "Re: Deploy approval",
        )]);
        let waiter = ReplyWaiter::with_connector(&config(), connector.clone());

        let reply = waiter.wait(&request(1)).await.unwrap().unwrap();
        assert_eq!(reply.from, "jane@example.com");
        assert_eq!(connector.log.lock().unwrap().attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newest_header_hit_wins() {
        let connector = MockConnector::with_replies(vec![
            StoredReply::new(3, Some(MESSAGE_ID), "Re: Deploy approval"),
            StoredReply::new(11, Some(MESSAGE_ID), "Re: Deploy approval"),
            StoredReply::new(7, Some(MESSAGE_ID), "Re: Deploy approval"),
        ]);
        let waiter = ReplyWaiter::with_connector(&config(), connector);

        let reply = waiter.wait(&request(1)).await.unwrap().unwrap();
        assert_eq!(reply.body, "Reply 11");
    }

    #[tokio::test(start_paused = true)]
    async fn test_references_strategy() {
        let mut reply = StoredReply::new(5, None, "Re: Deploy approval");
        reply.headers.push(("References", format!("<older@x> {MESSAGE_ID}")));
        let connector = MockConnector::with_replies(vec![reply]);
        let waiter = ReplyWaiter::with_connector(&config(), connector.clone());

        assert!(waiter.wait(&request(1)).await.unwrap().is_some());
        let log = connector.log.lock().unwrap();
        assert_eq!(log.searches, vec![(1, "In-Reply-To"), (1, "References")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subject_fallback_waits_for_second_cycle() {
        let connector = MockConnector::with_replies(vec![
            StoredReply::new(6, Some(MESSAGE_ID), "Re: Deploy approval").unindexed(),
        ]);
        let waiter = ReplyWaiter::with_connector(&config(), connector.clone());
        let started = Instant::now();

        let reply = waiter.wait(&request(1)).await.unwrap().unwrap();
        assert_eq!(reply.body, "Reply 6");
        assert_eq!(started.elapsed(), Duration::from_secs(5));

        let log = connector.log.lock().unwrap();
        assert_eq!(
            log.searches,
            vec![
                (1, "In-Reply-To"),
                (1, "References"),
                (2, "In-Reply-To"),
                (2, "References"),
                (2, "Subject"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_subject_match_with_wrong_in_reply_to_rejected() {
        let connector = MockConnector::with_replies(vec![
            StoredReply::new(6, Some("<unrelated@example.com>"), "Re: Deploy approval"),
            StoredReply::new(8, None, "Deploy approval"),
        ]);
        let waiter = ReplyWaiter::with_connector(&config(), connector.clone());

        let err = waiter.wait(&request(1)).await.unwrap_err();
        assert!(matches!(err, WaitError::Timeout { .. }));

        let log = connector.log.lock().unwrap();
        assert!(log.envelope_fetches.contains(&6));
        assert!(log.envelope_fetches.contains(&8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subject_fallback_newest_validated_wins() {
        let connector = MockConnector::with_replies(vec![
            StoredReply::new(3, Some(MESSAGE_ID), "Re: Deploy approval").unindexed(),
            StoredReply::new(9, Some("<unrelated@x>"), "Re: Deploy approval").unindexed(),
            StoredReply::new(8, Some(MESSAGE_ID), "RE: Deploy approval").unindexed(),
        ]);
        let waiter = ReplyWaiter::with_connector(&config(), connector.clone());

        let reply = waiter.wait(&request(1)).await.unwrap().unwrap();
        assert_eq!(reply.body, "Reply 8");
        assert_eq!(connector.log.lock().unwrap().envelope_fetches, vec![9, 8]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_reply_found_on_later_cycle() {
        let connector = MockConnector::with_replies(vec![
            StoredReply::new(2, Some(MESSAGE_ID), "Re: Deploy approval").arriving_on(4),
        ]);
        let waiter = ReplyWaiter::with_connector(&config(), connector.clone());
        let started = Instant::now();

        assert!(waiter.wait(&request(1)).await.unwrap().is_some());
        assert_eq!(started.elapsed(), Duration::from_secs(15));
        let log = connector.log.lock().unwrap();
        assert_eq!(log.opened, 4);
        assert_eq!(log.logouts, 4);
    }
}
