//! Reply correlation: wait for, find, parse and clean a reply to a sent
//! notification.
//!
//! [`ReplyWaiter`] drives the poll loop. Each cycle opens a fresh
//! [`MailboxSession`] through a [`Connector`], runs the strategy chain in
//! [`search`], parses the hit with [`parse`] and strips quoted text with
//! [`sanitize`]. [`present`] renders the result for the terminal.

mod classify;
pub mod parse;
pub mod present;
pub mod sanitize;
pub mod search;
pub mod session;
mod waiter;

use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use crate::config::{EmailConfig, clamp_poll_interval};

pub use parse::{BODY_PLACEHOLDER, parse_message};
pub use present::{format_duration, render};
pub use sanitize::sanitize;
pub use search::{SearchStrategy, find_reply};
pub use session::{
    Connector, FetchedMessage, HeaderQuery, ImapConnector, ImapSession, MailboxSession,
    SessionError,
};
pub use waiter::{ReplyWaiter, wait_for_reply};

/// A correlated reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailResponse {
    /// Sender address.
    pub from: String,
    /// Date header, in the sender's offset.
    pub date: Option<DateTime<FixedOffset>>,
    /// Decoded subject.
    pub subject: String,
    /// Reply text with quoted original removed.
    pub body: String,
}

/// What to wait for and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitRequest {
    /// Message-ID of the sent notification, with or without brackets.
    pub message_id: String,
    /// Subject of the sent notification; enables the subject fallback.
    pub subject: String,
    /// Minutes to wait; 0 returns immediately.
    pub deadline_minutes: u32,
    /// Include HTML parts in the body.
    pub full_layout: bool,
    /// Seconds between cycles, clamped to 3..=60; 0 means the default.
    pub poll_interval_seconds: u64,
}

impl WaitRequest {
    /// Builds a request, taking layout and poll interval from `config`.
    #[must_use]
    pub fn new(
        config: &EmailConfig,
        message_id: impl Into<String>,
        subject: impl Into<String>,
        deadline_minutes: u32,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            subject: subject.into(),
            deadline_minutes,
            full_layout: config.wait_for_response_full_layout,
            poll_interval_seconds: config.imap_poll_interval_seconds,
        }
    }

    /// Sets whether HTML parts are included.
    #[must_use]
    pub const fn full_layout(mut self, full_layout: bool) -> Self {
        self.full_layout = full_layout;
        self
    }

    /// Effective poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        clamp_poll_interval(self.poll_interval_seconds)
    }

    /// Deadline as a duration.
    #[must_use]
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(u64::from(self.deadline_minutes) * 60)
    }
}
