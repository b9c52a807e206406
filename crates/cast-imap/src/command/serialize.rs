//! Wire encoding.
//!
//! A string that is not a plain atom goes out quoted, unless it holds 8-bit
//! bytes or CR/LF: quoted strings are 7-bit only, so those become literals.
//! A synchronizing literal `{n}` splits the command, and the rest may only
//! be sent after the server answers `+`. When the server offers LITERAL+
//! the `{n+}` form is used and the command goes out in one piece.

use super::types::{FetchAttribute, FetchItems, SearchCriteria};

/// An encoded command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    parts: Vec<Vec<u8>>,
}

impl Request {
    /// The pieces to send, in order. Each piece except the last ends in a
    /// literal announcement that the server must answer with `+`.
    #[must_use]
    pub fn parts(&self) -> &[Vec<u8>] {
        &self.parts
    }

    /// The command as the server ends up receiving it.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.parts.concat()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Form {
    Atom,
    Quoted,
    Literal,
}

fn form(value: &str) -> Form {
    let bytes = value.as_bytes();
    if bytes.iter().any(|&b| !(0x20..0x7f).contains(&b)) {
        Form::Literal
    } else if bytes.is_empty() || bytes.iter().any(|b| b" (){%*+\"\\[]".contains(b)) {
        Form::Quoted
    } else {
        Form::Atom
    }
}

pub(super) struct Encoder {
    literal_plus: bool,
    done: Vec<Vec<u8>>,
    current: Vec<u8>,
}

impl Encoder {
    pub(super) fn new(tag: &str, literal_plus: bool) -> Self {
        let mut current = Vec::with_capacity(64);
        current.extend_from_slice(tag.as_bytes());
        current.push(b' ');
        Self {
            literal_plus,
            done: Vec::new(),
            current,
        }
    }

    /// Protocol text, written as is.
    pub(super) fn raw(&mut self, text: &str) {
        self.current.extend_from_slice(text.as_bytes());
    }

    pub(super) fn astring(&mut self, value: &str) {
        match form(value) {
            Form::Atom => self.raw(value),
            Form::Quoted => {
                self.current.push(b'"');
                for &b in value.as_bytes() {
                    if b == b'"' || b == b'\\' {
                        self.current.push(b'\\');
                    }
                    self.current.push(b);
                }
                self.current.push(b'"');
            }
            Form::Literal => {
                let len = value.len();
                if self.literal_plus {
                    self.raw(&format!("{{{len}+}}\r\n"));
                } else {
                    self.raw(&format!("{{{len}}}\r\n"));
                    self.done.push(std::mem::take(&mut self.current));
                }
                self.current.extend_from_slice(value.as_bytes());
            }
        }
    }

    /// Search keys; a conjunction under OR is parenthesised so it stays one key.
    pub(super) fn search(&mut self, criteria: &SearchCriteria) {
        match criteria {
            SearchCriteria::Since(date) => {
                self.raw("SINCE ");
                self.raw(date);
            }
            SearchCriteria::Younger(seconds) => self.raw(&format!("YOUNGER {seconds}")),
            SearchCriteria::Header(name, value) => {
                self.raw("HEADER ");
                self.astring(name);
                self.raw(" ");
                self.astring(value);
            }
            SearchCriteria::And(all) => {
                for (i, key) in all.iter().enumerate() {
                    if i > 0 {
                        self.raw(" ");
                    }
                    self.search(key);
                }
            }
            SearchCriteria::Or(a, b) => {
                self.raw("OR ");
                self.grouped(a);
                self.raw(" ");
                self.grouped(b);
            }
        }
    }

    fn grouped(&mut self, criteria: &SearchCriteria) {
        if matches!(criteria, SearchCriteria::And(all) if all.len() > 1) {
            self.raw("(");
            self.search(criteria);
            self.raw(")");
        } else {
            self.search(criteria);
        }
    }

    pub(super) fn fetch_items(&mut self, items: &FetchItems) {
        let names: Vec<&str> = items
            .attributes()
            .iter()
            .copied()
            .map(FetchAttribute::as_str)
            .collect();
        match names.as_slice() {
            [single] => self.raw(single),
            many => self.raw(&format!("({})", many.join(" "))),
        }
    }

    pub(super) fn finish(mut self) -> Request {
        self.current.extend_from_slice(b"\r\n");
        self.done.push(self.current);
        Request { parts: self.done }
    }
}
