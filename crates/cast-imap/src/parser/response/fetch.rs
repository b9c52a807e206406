//! FETCH data: UID, ENVELOPE, BODYSTRUCTURE and body sections.

use crate::Result;
use crate::parser::lexer::{Lexer, Token};
use crate::types::Uid;

use super::types::{Address, BodyStructure, Envelope, FetchItem};

/// Parses `(name value name value ...)`.
///
/// Items this client never asks for (FLAGS, MODSEQ, X-GM-LABELS, ...) are
/// skipped, not rejected, since servers add them unprompted.
pub fn fetch_items(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(b'(')?;
    let mut items = Vec::new();
    loop {
        let name = match lexer.next_token()? {
            Token::Close => return Ok(items),
            Token::Space => continue,
            Token::Atom(name) => name.to_ascii_uppercase(),
            other => return Err(lexer.malformed(format!("expected FETCH item, got {other:?}"))),
        };
        match name.as_str() {
            "UID" => {
                lexer.expect(b' ')?;
                let n = lexer.number()?;
                items.push(FetchItem::Uid(
                    Uid::new(n).ok_or_else(|| lexer.malformed("UID 0"))?,
                ));
            }
            "ENVELOPE" => {
                lexer.expect(b' ')?;
                items.push(FetchItem::Envelope(Box::new(envelope(lexer)?)));
            }
            "BODYSTRUCTURE" | "BODY" if lexer.peek() == Some(b' ') => {
                lexer.expect(b' ')?;
                items.push(FetchItem::Structure(body_structure(lexer)?));
            }
            "BODY" | "BINARY" => {
                let (section, origin) = section_spec(lexer)?;
                lexer.expect(b' ')?;
                let data = lexer.nstring_bytes()?.map(std::borrow::Cow::into_owned);
                items.push(FetchItem::Body {
                    section,
                    origin,
                    data,
                });
            }
            "RFC822" => {
                lexer.expect(b' ')?;
                let data = lexer.nstring_bytes()?.map(std::borrow::Cow::into_owned);
                items.push(FetchItem::Body {
                    section: None,
                    origin: None,
                    data,
                });
            }
            _ => skip_item_value(lexer)?,
        }
    }
}

/// `[section]<origin>`; `BODY[]` gives a `None` section.
fn section_spec(lexer: &mut Lexer<'_>) -> Result<(Option<String>, Option<u32>)> {
    lexer.expect(b'[')?;
    let rest = lexer.rest();
    let len = rest
        .iter()
        .position(|&b| b == b']')
        .ok_or_else(|| lexer.malformed("unterminated section"))?;
    let section = String::from_utf8_lossy(&rest[..len]).into_owned();
    for _ in 0..=len {
        lexer.bump();
    }

    let origin = if lexer.eat(b'<') {
        let origin = lexer.number()?;
        lexer.expect(b'>')?;
        Some(origin)
    } else {
        None
    };
    Ok(((!section.is_empty()).then_some(section), origin))
}

fn envelope(lexer: &mut Lexer<'_>) -> Result<Envelope> {
    lexer.expect(b'(')?;
    let date = lexer.nstring()?;
    lexer.expect(b' ')?;
    let subject = lexer.nstring()?;
    lexer.expect(b' ')?;
    let from = addresses(lexer)?;
    // sender, reply-to, to, cc, bcc
    for _ in 0..5 {
        lexer.expect(b' ')?;
        addresses(lexer)?;
    }
    lexer.expect(b' ')?;
    let in_reply_to = lexer.nstring()?;
    lexer.expect(b' ')?;
    let message_id = lexer.nstring()?;
    lexer.expect(b')')?;

    Ok(Envelope {
        date,
        subject,
        from,
        in_reply_to,
        message_id,
    })
}

fn addresses(lexer: &mut Lexer<'_>) -> Result<Vec<Address>> {
    let mut list = Vec::new();
    match lexer.next_token()? {
        Token::Nil => return Ok(list),
        Token::Open => {}
        other => return Err(lexer.malformed(format!("expected address list, got {other:?}"))),
    }
    loop {
        match lexer.next_token()? {
            Token::Close => return Ok(list),
            Token::Space => {}
            Token::Open => {
                let name = lexer.nstring()?;
                lexer.expect(b' ')?;
                let _route = lexer.nstring_bytes()?;
                lexer.expect(b' ')?;
                let mailbox = lexer.nstring()?;
                lexer.expect(b' ')?;
                let host = lexer.nstring()?;
                lexer.expect(b')')?;
                list.push(Address {
                    name,
                    mailbox,
                    host,
                });
            }
            other => return Err(lexer.malformed(format!("unexpected {other:?} in address list"))),
        }
    }
}

/// Reads a body structure down to type and subtype; parameters, encodings,
/// sizes and extension data are skipped.
fn body_structure(lexer: &mut Lexer<'_>) -> Result<BodyStructure> {
    lexer.expect(b'(')?;

    let mut parts = Vec::new();
    loop {
        // Some servers put spaces between multipart children.
        lexer.eat(b' ');
        if lexer.peek() != Some(b'(') {
            break;
        }
        parts.push(body_structure(lexer)?);
    }

    let mime_type = if parts.is_empty() {
        let kind = lexer.nstring()?.unwrap_or_default();
        lexer.expect(b' ')?;
        let subtype = lexer.nstring()?.unwrap_or_default();
        format!("{kind}/{subtype}")
    } else {
        format!("multipart/{}", lexer.nstring()?.unwrap_or_default())
    };
    close_list(lexer)?;

    Ok(BodyStructure {
        mime_type: mime_type.to_ascii_lowercase(),
        parts,
    })
}

/// Consumes tokens through the `)` that closes the current list.
fn close_list(lexer: &mut Lexer<'_>) -> Result<()> {
    let mut depth = 1_u32;
    while depth > 0 {
        match lexer.next_token()? {
            Token::Open => depth += 1,
            Token::Close => depth -= 1,
            Token::End => return Err(lexer.malformed("unbalanced parentheses")),
            _ => {}
        }
    }
    Ok(())
}

fn skip_item_value(lexer: &mut Lexer<'_>) -> Result<()> {
    if lexer.peek() == Some(b'[') {
        section_spec(lexer)?;
    }
    lexer.expect(b' ')?;
    match lexer.next_token()? {
        Token::Open => close_list(lexer),
        _ => Ok(()),
    }
}
