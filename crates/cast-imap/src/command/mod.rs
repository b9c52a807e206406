//! Commands and their wire encoding.

mod serialize;
mod tag_generator;
mod types;

use std::fmt;

use crate::types::Uid;

pub use serialize::Request;
pub use tag_generator::TagGenerator;
pub use types::{FetchAttribute, FetchItems, SearchCriteria};

use serialize::Encoder;

/// A command this client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `CAPABILITY`
    Capability,
    /// `STARTTLS`
    StartTls,
    /// `LOGIN user password`
    Login {
        /// User name.
        username: String,
        /// Password; never logged.
        password: String,
    },
    /// `SELECT mailbox`
    Select {
        /// Mailbox name.
        mailbox: String,
    },
    /// `UID SEARCH [CHARSET UTF-8] criteria`
    UidSearch {
        /// Search keys.
        criteria: SearchCriteria,
    },
    /// `UID FETCH uid items`
    UidFetch {
        /// Message to fetch.
        uid: Uid,
        /// What to fetch.
        items: FetchItems,
    },
    /// `LOGOUT`
    Logout,
}

impl Command {
    /// Command name for logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::StartTls => "STARTTLS",
            Self::Login { .. } => "LOGIN",
            Self::Select { .. } => "SELECT",
            Self::UidSearch { .. } => "UID SEARCH",
            Self::UidFetch { .. } => "UID FETCH",
            Self::Logout => "LOGOUT",
        }
    }

    /// Encodes the command under `tag`.
    ///
    /// With `literal_plus` any literal is sent non-synchronizing and the
    /// request is a single piece.
    #[must_use]
    pub fn encode(&self, tag: &str, literal_plus: bool) -> Request {
        let mut out = Encoder::new(tag, literal_plus);
        out.raw(self.name());
        match self {
            Self::Capability | Self::StartTls | Self::Logout => {}
            Self::Login { username, password } => {
                out.raw(" ");
                out.astring(username);
                out.raw(" ");
                out.astring(password);
            }
            Self::Select { mailbox } => {
                out.raw(" ");
                out.astring(mailbox);
            }
            Self::UidSearch { criteria } => {
                if !criteria.is_ascii() {
                    out.raw(" CHARSET UTF-8");
                }
                out.raw(" ");
                out.search(criteria);
            }
            Self::UidFetch { uid, items } => {
                out.raw(&format!(" {uid} "));
                out.fetch_items(items);
            }
        }
        out.finish()
    }
}

/// Loggable form; the LOGIN password is masked.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        match self {
            Self::Login { username, .. } => write!(f, " {username} ****"),
            Self::Select { mailbox } => write!(f, " {mailbox}"),
            Self::UidFetch { uid, .. } => write!(f, " {uid}"),
            _ => Ok(()),
        }
    }
}
