//! Pieces of the grammar shared by several responses.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{Capability, ResponseCode, Uid};
use crate::Result;

/// `resp-text`: optional `[code]`, then free text up to CRLF.
pub fn resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
    // Servers differ on whether a space follows a bare status word.
    lexer.eat(b' ');
    let code = if lexer.peek() == Some(b'[') {
        let code = response_code(lexer)?;
        lexer.eat(b' ');
        Some(code)
    } else {
        None
    };
    let text = String::from_utf8_lossy(lexer.line()).into_owned();
    Ok((code, text))
}

fn response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(b'[')?;
    let name = lexer.atom()?;
    let code = if name.eq_ignore_ascii_case("CAPABILITY") {
        ResponseCode::Capability(capabilities(lexer)?)
    } else if name.eq_ignore_ascii_case("UIDNEXT") {
        lexer.expect(b' ')?;
        let uid = lexer.number()?;
        ResponseCode::UidNext(Uid::new(uid).ok_or_else(|| lexer.malformed("UIDNEXT 0"))?)
    } else if name.eq_ignore_ascii_case("UIDVALIDITY") {
        lexer.expect(b' ')?;
        ResponseCode::UidValidity(lexer.number()?)
    } else {
        ResponseCode::Other(name.to_ascii_uppercase())
    };

    // Arguments of codes kept only by name, e.g. PERMANENTFLAGS (...).
    while !matches!(lexer.peek(), Some(b']') | None) {
        lexer.bump();
    }
    lexer.expect(b']')?;
    Ok(code)
}

/// Space-separated capability atoms, up to `]` or the end of the line.
pub fn capabilities(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();
    while lexer.eat(b' ') {
        if let Token::Atom(atom) = lexer.next_token()? {
            caps.push(Capability::from(atom));
        }
    }
    Ok(caps)
}

/// The numbers of a SEARCH response; a trailing `(MODSEQ n)` is dropped.
pub fn search_hits(lexer: &mut Lexer<'_>) -> Result<Vec<u32>> {
    let mut hits = Vec::new();
    while lexer.eat(b' ') {
        match lexer.next_token()? {
            Token::Number(n) if n > 0 => hits.push(n),
            Token::Open => break,
            _ => {}
        }
    }
    Ok(hits)
}
