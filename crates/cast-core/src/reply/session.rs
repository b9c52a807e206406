//! One mailbox session per poll cycle.
//!
//! [`Connector`] and [`MailboxSession`] are the seam between the poll loop
//! and the network: [`ImapConnector`] speaks IMAP, tests substitute a
//! scripted mailbox.

use std::time::Duration;

use cast_imap::{
    Client, Envelope, FetchItem, FetchItems, ImapStream, SearchCriteria, Selected, Uid,
};
use chrono::{DateTime, TimeDelta, Utc};

use crate::config::EmailConfig;

/// How far back every search looks.
pub const SEARCH_WINDOW: Duration = Duration::from_secs(120);

/// Failures within a single poll cycle.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Connecting, logging in or selecting the folder failed.
    #[error("IMAP connection failed: {0}")]
    Connect(#[source] cast_imap::Error),

    /// A command on an open session failed.
    #[error("IMAP operation failed: {0}")]
    Operation(#[from] cast_imap::Error),

    /// A candidate could not be turned into a reply.
    #[error("Message {uid} could not be read: {reason}")]
    Unreadable {
        /// UID of the candidate.
        uid: u32,
        /// What was missing.
        reason: &'static str,
    },
}

/// Header search: `field` contains any of `values`, within the search window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderQuery {
    /// Header name.
    pub field: &'static str,
    /// Alternatives, OR-ed together.
    pub values: Vec<String>,
    /// Only messages received this recently.
    pub window: Duration,
}

impl HeaderQuery {
    /// Creates a query over [`SEARCH_WINDOW`].
    #[must_use]
    pub const fn new(field: &'static str, values: Vec<String>) -> Self {
        Self {
            field,
            values,
            window: SEARCH_WINDOW,
        }
    }

    /// Builds the IMAP criteria, or `None` when there is nothing to match.
    ///
    /// With WITHIN support the window is exact (`YOUNGER`). Otherwise
    /// `SINCE` is day-granular and compared against the server's local
    /// date, so the date is taken at UTC-12 to never cut the window short.
    #[must_use]
    pub fn criteria(&self, now: DateTime<Utc>, within: bool) -> Option<SearchCriteria> {
        let alternatives = SearchCriteria::any_of(
            self.values
                .iter()
                .map(|value| SearchCriteria::header(self.field, value.as_str()))
                .collect(),
        )?;

        let window = if within {
            SearchCriteria::Younger(u32::try_from(self.window.as_secs()).unwrap_or(u32::MAX))
        } else {
            let window = TimeDelta::from_std(self.window).unwrap_or(TimeDelta::zero());
            let earliest = now - window - TimeDelta::hours(12);
            SearchCriteria::Since(earliest.format("%d-%b-%Y").to_string())
        };

        Some(SearchCriteria::And(vec![window, alternatives]))
    }
}

/// A fetched candidate: envelope plus body sections in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessage {
    /// Message UID.
    pub uid: Uid,
    /// IMAP envelope, when the server sent one.
    pub envelope: Option<Envelope>,
    /// `(section, data)`; `None` is the entire message.
    pub sections: Vec<(Option<String>, Vec<u8>)>,
}

impl FetchedMessage {
    /// The raw message: the whole-message section when it has content,
    /// else the first non-empty section in server order.
    #[must_use]
    pub fn raw_body(&self) -> Option<&[u8]> {
        self.sections
            .iter()
            .find(|(section, data)| section.is_none() && !data.is_empty())
            .or_else(|| self.sections.iter().find(|(_, data)| !data.is_empty()))
            .map(|(_, data)| data.as_slice())
    }

    fn from_items(uid: Uid, items: Vec<FetchItem>) -> Self {
        let mut message = Self {
            uid,
            envelope: None,
            sections: Vec::new(),
        };
        for item in items {
            match item {
                FetchItem::Envelope(envelope) => message.envelope = Some(*envelope),
                FetchItem::Structure(structure) => tracing::trace!(
                    uid = %uid,
                    mime_type = %structure.mime_type,
                    parts = structure.leaf_count(),
                    "Message structure"
                ),
                FetchItem::Body {
                    section,
                    data: Some(data),
                    ..
                } => message.sections.push((section, data)),
                _ => {}
            }
        }
        message
    }
}

/// Opens sessions.
#[allow(async_fn_in_trait)]
pub trait Connector {
    /// Session type produced.
    type Session: MailboxSession;

    /// Connects, authenticates and selects the configured folder.
    async fn open(&self) -> Result<Self::Session, SessionError>;
}

/// An open, folder-selected session.
#[allow(async_fn_in_trait)]
pub trait MailboxSession {
    /// UIDs matching the query, in any order.
    async fn search(&mut self, query: &HeaderQuery) -> Result<Vec<Uid>, SessionError>;

    /// Envelope only; `None` if the message is gone.
    async fn fetch_envelope(&mut self, uid: Uid) -> Result<Option<Envelope>, SessionError>;

    /// Envelope, structure and raw message; `None` if the message is gone.
    async fn fetch_message(&mut self, uid: Uid) -> Result<Option<FetchedMessage>, SessionError>;

    /// Closes the session. Never fails: the connection is dropped either way.
    async fn logout(self);
}

/// [`Connector`] over a real IMAP server.
#[derive(Debug, Clone)]
pub struct ImapConnector {
    config: EmailConfig,
}

impl ImapConnector {
    /// Creates a connector; zero config values are resolved to defaults.
    #[must_use]
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            config: config.clone().with_defaults(),
        }
    }

    fn imap_config(&self) -> cast_imap::Config {
        cast_imap::Config::new(&self.config.imap_host, self.config.security())
            .with_port(self.config.imap_port)
            .with_timeout(self.config.io_timeout())
    }
}

impl Connector for ImapConnector {
    type Session = ImapSession;

    async fn open(&self) -> Result<ImapSession, SessionError> {
        let imap_config = self.imap_config();
        tracing::debug!(
            address = %imap_config.address(),
            security = ?imap_config.security,
            "Connecting to IMAP server"
        );

        let client = Client::connect(&imap_config)
            .await
            .map_err(SessionError::Connect)?;
        let client = client
            .login(&self.config.imap_username, &self.config.imap_password)
            .await
            .map_err(SessionError::Connect)?;
        let (client, status) = client
            .select(&self.config.imap_folder)
            .await
            .map_err(SessionError::Connect)?;

        tracing::debug!(
            folder = %self.config.imap_folder,
            exists = status.exists,
            uid_next = ?status.uid_next,
            "Folder selected"
        );
        Ok(ImapSession { client })
    }
}

/// [`MailboxSession`] over a selected IMAP connection.
#[derive(Debug)]
pub struct ImapSession {
    client: Client<ImapStream, Selected>,
}

impl MailboxSession for ImapSession {
    async fn search(&mut self, query: &HeaderQuery) -> Result<Vec<Uid>, SessionError> {
        let Some(criteria) = query.criteria(Utc::now(), self.client.supports_within()) else {
            return Ok(Vec::new());
        };
        let uids = self.client.uid_search(criteria).await?;
        tracing::debug!(field = query.field, hits = uids.len(), "Header search");
        Ok(uids)
    }

    async fn fetch_envelope(&mut self, uid: Uid) -> Result<Option<Envelope>, SessionError> {
        let items = self.client.uid_fetch(uid, FetchItems::envelope()).await?;
        Ok(items.and_then(|items| {
            items.into_iter().find_map(|item| match item {
                FetchItem::Envelope(envelope) => Some(*envelope),
                _ => None,
            })
        }))
    }

    async fn fetch_message(&mut self, uid: Uid) -> Result<Option<FetchedMessage>, SessionError> {
        let items = self
            .client
            .uid_fetch(uid, FetchItems::full_message())
            .await?;
        Ok(items.map(|items| FetchedMessage::from_items(uid, items)))
    }

    async fn logout(self) {
        self.client.logout().await;
    }
}
