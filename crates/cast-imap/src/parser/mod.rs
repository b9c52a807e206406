//! Sans-I/O response parsing.
//!
//! ```
//! use cast_imap::parser::{Response, ResponseParser, Untagged};
//!
//! let response = ResponseParser::parse(b"* SEARCH 3 8\r\n").unwrap();
//! assert_eq!(response, Response::Untagged(Untagged::Search(vec![3, 8])));
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{
    Address, BodyStructure, Envelope, FetchItem, Response, ResponseParser, Status, Untagged,
};
