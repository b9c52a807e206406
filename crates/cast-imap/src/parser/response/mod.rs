//! Response grammar on top of the [`Lexer`].

#![allow(clippy::missing_errors_doc)]

mod fetch;
mod helpers;
mod types;

pub use types::{Address, BodyStructure, Envelope, FetchItem, Status, Untagged};

use crate::parser::lexer::{Lexer, Token};
use crate::types::ResponseCode;
use crate::Result;

/// One server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Completion of the command sent with `tag`.
    Tagged {
        /// Command tag.
        tag: String,
        /// Outcome.
        status: Status,
        /// Bracketed code, if any.
        code: Option<ResponseCode>,
        /// Remaining text.
        text: String,
    },
    /// Server data.
    Untagged(Untagged),
    /// `+`: the server is ready for the rest of the command.
    Continuation(String),
}

/// Parses complete responses as read by the framing layer.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one response.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);
        match lexer.next_token()? {
            Token::Star => {
                lexer.expect(b' ')?;
                untagged(&mut lexer).map(Response::Untagged)
            }
            Token::Plus => {
                lexer.eat(b' ');
                Ok(Response::Continuation(
                    String::from_utf8_lossy(lexer.line()).into_owned(),
                ))
            }
            Token::Atom(tag) => {
                lexer.expect(b' ')?;
                let status = status(&mut lexer)?;
                let (code, text) = helpers::resp_text(&mut lexer)?;
                Ok(Response::Tagged {
                    tag: tag.to_string(),
                    status,
                    code,
                    text,
                })
            }
            other => Err(lexer.malformed(format!("expected *, + or a tag, got {other:?}"))),
        }
    }
}

fn status(lexer: &mut Lexer<'_>) -> Result<Status> {
    let word = lexer.atom()?;
    Status::from_atom(word).ok_or_else(|| lexer.malformed(format!("unknown status {word}")))
}

fn untagged(lexer: &mut Lexer<'_>) -> Result<Untagged> {
    match lexer.next_token()? {
        Token::Atom(word) => {
            if let Some(status) = Status::from_atom(word) {
                let (code, text) = helpers::resp_text(lexer)?;
                return Ok(Untagged::Condition { status, code, text });
            }
            let word = word.to_ascii_uppercase();
            Ok(match word.as_str() {
                "CAPABILITY" => Untagged::Capability(helpers::capabilities(lexer)?),
                "SEARCH" => Untagged::Search(helpers::search_hits(lexer)?),
                _ => Untagged::Ignored(word),
            })
        }
        Token::Number(n) => {
            lexer.expect(b' ')?;
            let word = lexer.atom()?.to_ascii_uppercase();
            match word.as_str() {
                "EXISTS" => Ok(Untagged::Exists(n)),
                "FETCH" => {
                    lexer.expect(b' ')?;
                    Ok(Untagged::Fetch {
                        seq: n,
                        items: fetch::fetch_items(lexer)?,
                    })
                }
                _ => Ok(Untagged::Ignored(word)),
            }
        }
        other => Err(lexer.malformed(format!("unexpected {other:?} after *"))),
    }
}
