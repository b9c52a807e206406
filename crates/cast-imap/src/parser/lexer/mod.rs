//! Byte-level tokenizer for server responses.
//!
//! Works on one complete response as framed by
//! [`FramedStream`](crate::FramedStream), literals included, and borrows
//! from it wherever it can.

#![allow(clippy::missing_errors_doc)]

mod token;

use std::borrow::Cow;

pub use token::Token;

use crate::{Error, Result};

/// Cursor over a response.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> Lexer<'a> {
    /// Starts at the beginning of `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Unconsumed input.
    #[must_use]
    pub fn rest(&self) -> &'a [u8] {
        &self.input[self.offset..]
    }

    /// The next byte, not consumed.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.rest().first().copied()
    }

    /// Consumes and returns the next byte.
    pub fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.offset += 1;
        Some(byte)
    }

    /// Consumes `byte` if it is next.
    pub fn eat(&mut self, byte: u8) -> bool {
        let hit = self.peek() == Some(byte);
        if hit {
            self.offset += 1;
        }
        hit
    }

    /// Consumes `byte` or fails.
    pub fn expect(&mut self, byte: u8) -> Result<()> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(self.malformed(format!("expected {:?}", char::from(byte))))
        }
    }

    /// Consumes everything up to and including the next CRLF and returns
    /// what came before it.
    pub fn line(&mut self) -> &'a [u8] {
        let rest = self.rest();
        let end = rest
            .windows(2)
            .position(|pair| pair == b"\r\n")
            .unwrap_or(rest.len());
        self.offset = (self.offset + end + 2).min(self.input.len());
        &rest[..end]
    }

    /// Reads the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::End);
        };
        let punct = match byte {
            b'(' => Token::Open,
            b')' => Token::Close,
            b'[' => Token::OpenBracket,
            b']' => Token::CloseBracket,
            b' ' => Token::Space,
            b'*' => Token::Star,
            b'+' => Token::Plus,
            b'"' => return self.quoted(),
            b'{' => return self.literal(),
            b'\r' => {
                return if self.rest().starts_with(b"\r\n") {
                    self.offset += 2;
                    Ok(Token::Crlf)
                } else {
                    Err(self.malformed("bare CR"))
                };
            }
            b if is_atom_char(b) => return Ok(self.atom_token()),
            b => return Err(self.malformed(format!("unexpected byte {b:#04x}"))),
        };
        self.offset += 1;
        Ok(punct)
    }

    fn quoted(&mut self) -> Result<Token<'a>> {
        self.offset += 1;
        let start = self.offset;
        let mut unescaped: Option<Vec<u8>> = None;
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\\') => {
                    let escaped = match self.bump() {
                        Some(b @ (b'"' | b'\\')) => b,
                        _ => return Err(self.malformed("bad escape in quoted string")),
                    };
                    let owned = unescaped
                        .get_or_insert_with(|| self.input[start..self.offset - 2].to_vec());
                    owned.push(escaped);
                }
                Some(b) => {
                    if let Some(owned) = unescaped.as_mut() {
                        owned.push(b);
                    }
                }
                None => return Err(self.malformed("unterminated quoted string")),
            }
        }
        Ok(Token::Str(unescaped.map_or_else(
            || Cow::Borrowed(&self.input[start..self.offset - 1]),
            Cow::Owned,
        )))
    }

    fn literal(&mut self) -> Result<Token<'a>> {
        self.offset += 1;
        let digits = self.rest().iter().take_while(|b| b.is_ascii_digit()).count();
        let size = std::str::from_utf8(&self.rest()[..digits])
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| self.malformed("bad literal size"))?;
        self.offset += digits;
        self.eat(b'+');
        if !self.rest().starts_with(b"}\r\n") {
            return Err(self.malformed("expected }CRLF after literal size"));
        }
        self.offset += 3;
        if self.rest().len() < size {
            return Err(self.malformed("literal shorter than announced"));
        }
        let data = &self.rest()[..size];
        self.offset += size;
        Ok(Token::Str(Cow::Borrowed(data)))
    }

    fn atom_token(&mut self) -> Token<'a> {
        let len = self.rest().iter().take_while(|&&b| is_atom_char(b)).count();
        let bytes = &self.rest()[..len];
        self.offset += len;
        // Atom characters are ASCII.
        let atom = std::str::from_utf8(bytes).unwrap_or_default();
        if bytes.iter().all(u8::is_ascii_digit)
            && let Ok(n) = atom.parse()
        {
            Token::Number(n)
        } else if atom.eq_ignore_ascii_case("NIL") {
            Token::Nil
        } else {
            Token::Atom(atom)
        }
    }

    /// Reads an atom.
    pub fn atom(&mut self) -> Result<&'a str> {
        match self.next_token()? {
            Token::Atom(atom) => Ok(atom),
            other => Err(self.malformed(format!("expected atom, got {other:?}"))),
        }
    }

    /// Reads a number.
    pub fn number(&mut self) -> Result<u32> {
        match self.next_token()? {
            Token::Number(n) => Ok(n),
            other => Err(self.malformed(format!("expected number, got {other:?}"))),
        }
    }

    /// Reads a string or `NIL`, keeping the raw bytes.
    pub fn nstring_bytes(&mut self) -> Result<Option<Cow<'a, [u8]>>> {
        match self.next_token()? {
            Token::Nil => Ok(None),
            Token::Str(bytes) => Ok(Some(bytes)),
            other => Err(self.malformed(format!("expected string or NIL, got {other:?}"))),
        }
    }

    /// Reads a string or `NIL` as text; invalid UTF-8 is replaced.
    pub fn nstring(&mut self) -> Result<Option<String>> {
        Ok(self
            .nstring_bytes()?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Parse error at the current offset.
    pub(crate) fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::Malformed {
            offset: self.offset,
            reason: reason.into(),
        }
    }
}

/// Bytes allowed in an atom as servers send them.
///
/// `\` is accepted so flags lex as one atom; `[` is not, so `BODY[` splits.
#[must_use]
pub fn is_atom_char(b: u8) -> bool {
    b.is_ascii_graphic() && !b"(){%*\"[]".contains(&b)
}
