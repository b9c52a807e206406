//! Parsed response data.

use std::fmt;

use crate::types::{Capability, ResponseCode, Uid};

/// Status word of a status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `OK`
    Ok,
    /// `NO`: the command failed.
    No,
    /// `BAD`: the command was not understood.
    Bad,
    /// `PREAUTH` greeting.
    PreAuth,
    /// `BYE`: the server is closing the connection.
    Bye,
}

impl Status {
    pub(crate) fn from_atom(atom: &str) -> Option<Self> {
        [Self::Ok, Self::No, Self::Bad, Self::PreAuth, Self::Bye]
            .into_iter()
            .find(|status| atom.eq_ignore_ascii_case(status.as_str()))
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Bad => "BAD",
            Self::PreAuth => "PREAUTH",
            Self::Bye => "BYE",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Untagged (`* ...`) server data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Untagged {
    /// `* OK|NO|BAD|PREAUTH|BYE [code] text`
    Condition {
        /// Status word.
        status: Status,
        /// Bracketed code, if any.
        code: Option<ResponseCode>,
        /// Remaining text.
        text: String,
    },
    /// `* CAPABILITY ...`
    Capability(Vec<Capability>),
    /// `* n EXISTS`
    Exists(u32),
    /// `* SEARCH ...`; UIDs when answering UID SEARCH.
    Search(Vec<u32>),
    /// `* n FETCH (...)`
    Fetch {
        /// Sequence number.
        seq: u32,
        /// Items in server order.
        items: Vec<FetchItem>,
    },
    /// Data this client does not use, by keyword (`FLAGS`, `RECENT`, ...).
    Ignored(String),
}

/// One FETCH data item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItem {
    /// `UID n`
    Uid(Uid),
    /// `ENVELOPE (...)`
    Envelope(Box<Envelope>),
    /// `BODYSTRUCTURE (...)`
    Structure(BodyStructure),
    /// `BODY[section]<origin> data`, also `RFC822 data`.
    Body {
        /// `None` for the whole message.
        section: Option<String>,
        /// Start octet of a partial fetch.
        origin: Option<u32>,
        /// `None` when the server sent NIL.
        data: Option<Vec<u8>>,
    },
}

/// The envelope fields reply correlation looks at.
///
/// Values are as the server sent them; encoded words are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// `Date`
    pub date: Option<String>,
    /// `Subject`
    pub subject: Option<String>,
    /// `From`
    pub from: Vec<Address>,
    /// `In-Reply-To`
    pub in_reply_to: Option<String>,
    /// `Message-ID`
    pub message_id: Option<String>,
}

/// An envelope address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Display name.
    pub name: Option<String>,
    /// Local part.
    pub mailbox: Option<String>,
    /// Domain.
    pub host: Option<String>,
}

impl Address {
    /// `mailbox@host`; `None` for group markers and partial addresses.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        Some(format!("{}@{}", self.mailbox.as_ref()?, self.host.as_ref()?))
    }
}

/// MIME shape of a message: a lowercase `type/subtype` and, for multiparts,
/// the children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyStructure {
    /// For example `text/plain` or `multipart/alternative`.
    pub mime_type: String,
    /// Child parts; empty for a leaf.
    pub parts: Vec<Self>,
}

impl BodyStructure {
    /// Number of leaf parts.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        if self.parts.is_empty() {
            1
        } else {
            self.parts.iter().map(Self::leaf_count).sum()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_email() {
        let address = Address {
            name: Some("Ana".into()),
            mailbox: Some("ana".into()),
            host: Some("example.com".into()),
        };
        assert_eq!(address.email().as_deref(), Some("ana@example.com"));

        let group = Address {
            mailbox: Some("undisclosed-recipients".into()),
            ..Address::default()
        };
        assert_eq!(group.email(), None);
    }

    #[test]
    fn test_status_words() {
        assert_eq!(Status::from_atom("ok"), Some(Status::Ok));
        assert_eq!(Status::from_atom("PREAUTH"), Some(Status::PreAuth));
        assert_eq!(Status::from_atom("MAYBE"), None);
        assert_eq!(Status::Bad.to_string(), "BAD");
    }

    #[test]
    fn test_leaf_count() {
        let leaf = |t: &str| BodyStructure {
            mime_type: t.into(),
            parts: Vec::new(),
        };
        let nested = BodyStructure {
            mime_type: "multipart/mixed".into(),
            parts: vec![
                BodyStructure {
                    mime_type: "multipart/alternative".into(),
                    parts: vec![leaf("text/plain"), leaf("text/html")],
                },
                leaf("application/pdf"),
            ],
        };
        assert_eq!(nested.leaf_count(), 3);
        assert_eq!(leaf("text/plain").leaf_count(), 1);
    }
}
