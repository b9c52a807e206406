//! # cast-mime
//!
//! MIME parsing for reading email replies.
//!
//! ## Features
//!
//! - **Message parsing**: recursive multipart walking into an entity tree
//! - **Inline text extraction**: attachments skipped, HTML optional
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 encoded words
//! - **Charsets**: UTF-8, Latin-1 and Windows-1252 converted to UTF-8
//!
//! ## Quick Start
//!
//! ```
//! use cast_mime::Message;
//!
//! let raw = b"From: Ana <ana@example.com>\r\n\
//!             Subject: =?utf-8?Q?Re:_Ol=C3=A1?=\r\n\
//!             Content-Type: text/plain; charset=utf-8\r\n\
//!             \r\n\
//!             Approved.";
//!
//! let message = Message::parse(raw).unwrap();
//! assert_eq!(message.subject().as_deref(), Some("Re: Olá"));
//! assert_eq!(message.from_address().as_deref(), Some("ana@example.com"));
//! assert_eq!(message.inline_texts(false), vec!["Approved."]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod charset;
mod content_type;
mod disposition;
mod error;
mod header;
mod message;

pub mod encoding;

pub use charset::decode_charset;
pub use content_type::ContentType;
pub use disposition::{Disposition, DispositionKind};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Body, Entity, Message, TransferEncoding};
