//! # cast-imap
//!
//! A small async IMAP4rev1 client covering what reply correlation needs:
//! connect (implicit TLS, STARTTLS or plaintext), LOGIN, SELECT, UID SEARCH
//! and UID FETCH.
//!
//! ## Features
//!
//! - **Type-state connection management**: compile-time enforcement of valid
//!   IMAP state transitions (`NotAuthenticated` → `Authenticated` → `Selected`)
//! - **TLS via rustls**: no OpenSSL dependency
//! - **Bounded commands**: one deadline covers each command from the first
//!   byte sent to its tagged completion
//! - **8-bit safe arguments**: non-ASCII strings go out as literals
//! - **Sans-I/O parser**: protocol parsing separated from network I/O
//!
//! ## Quick Start
//!
//! ```ignore
//! use cast_imap::{Client, Config, FetchItems, SearchCriteria, Security};
//!
//! #[tokio::main]
//! async fn main() -> cast_imap::Result<()> {
//!     let config = Config::new("imap.example.com", Security::Implicit);
//!     let client = Client::connect(&config).await?;
//!     let client = client.login("user@example.com", "password").await?;
//!     let (mut client, status) = client.select("INBOX").await?;
//!     println!("Messages: {}", status.exists);
//!
//!     let criteria = SearchCriteria::header("In-Reply-To", "<id@example.com>");
//!     for uid in client.uid_search(criteria).await? {
//!         let items = client.uid_fetch(uid, FetchItems::envelope()).await?;
//!         println!("{uid}: {items:?}");
//!     }
//!
//!     client.logout().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: command builders and serialization
//! - [`connection`]: configuration, streams, framing and the type-state client
//! - [`parser`]: sans-I/O response parser
//! - [`types`]: UIDs, capabilities, response codes and mailbox status

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, FetchAttribute, FetchItems, Request, SearchCriteria, TagGenerator};
pub use connection::{
    Authenticated, Client, Config, FramedStream, ImapStream, NotAuthenticated, Security, Selected,
    connect,
};
pub use error::{Error, Result};
pub use parser::{
    Address, BodyStructure, Envelope, FetchItem, Response, ResponseParser, Status, Untagged,
};
pub use types::{Capability, MailboxStatus, ResponseCode, Uid};
