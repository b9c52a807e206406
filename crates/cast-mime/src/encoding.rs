//! Transfer-encoding and header-encoding decoders.
//!
//! Supports Base64, Quoted-Printable and RFC 2047 encoded words. Decoders
//! are lenient: mail in the wild is frequently slightly malformed.

use crate::charset::decode_charset;
use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decodes Base64 data, ignoring embedded whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks are removed; an `=` that does not start a valid escape
/// is kept as-is.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break, possibly with trailing whitespace before it.
        let mut j = i + 1;
        while j < data.len() && matches!(data[j], b' ' | b'\t') {
            j += 1;
        }
        if data.get(j) == Some(&b'\n') {
            i = j + 1;
            continue;
        }
        if data.get(j) == Some(&b'\r') && data.get(j + 1) == Some(&b'\n') {
            i = j + 2;
            continue;
        }

        match (
            data.get(i + 1).copied().and_then(hex_value),
            data.get(i + 2).copied().and_then(hex_value),
        ) {
            (Some(hi), Some(lo)) => {
                result.push(hi << 4 | lo);
                i += 3;
            }
            _ => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    result
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Whitespace between two adjacent encoded words is dropped. Words that
/// fail to decode are left verbatim.
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    let mut pending_space = "";
    let mut after_word = false;

    while !rest.is_empty() {
        let Some(start) = rest.find("=?") else {
            result.push_str(pending_space);
            result.push_str(rest);
            return result;
        };

        let (before, candidate) = rest.split_at(start);
        if let Some((decoded, consumed)) = decode_word(candidate) {
            // Adjacent encoded words: the separating whitespace is dropped.
            if !(after_word && before.trim().is_empty()) {
                result.push_str(pending_space);
                result.push_str(before);
            }
            result.push_str(&decoded);
            rest = &candidate[consumed..];
            pending_space = "";
            after_word = true;

            let trimmed = rest.trim_start_matches([' ', '\t', '\r', '\n']);
            if trimmed.starts_with("=?") {
                pending_space = &rest[..rest.len() - trimmed.len()];
                rest = trimmed;
            }
        } else {
            result.push_str(pending_space);
            result.push_str(before);
            result.push_str("=?");
            rest = &candidate[2..];
            pending_space = "";
            after_word = false;
        }
    }

    result
}

/// Decodes one `=?charset?enc?text?=` word at the start of `s`.
///
/// Returns the decoded text and the number of bytes consumed.
fn decode_word(s: &str) -> Option<(String, usize)> {
    let inner = s.strip_prefix("=?")?;
    let (charset, inner) = inner.split_once('?')?;
    let (encoding, inner) = inner.split_once('?')?;
    let end = inner.find("?=")?;
    let payload = &inner[..end];
    if payload.contains(|c: char| c.is_ascii_whitespace()) {
        return None;
    }

    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;

    // RFC 2231 language suffix: `utf-8*pt-BR`.
    let charset = charset.split('*').next().unwrap_or(charset);
    let bytes = match encoding {
        "B" | "b" => decode_base64(payload.as_bytes()).ok()?,
        "Q" | "q" => decode_quoted_printable(payload.replace('_', " ").as_bytes()),
        _ => return None,
    };

    Some((decode_charset(&bytes, charset), consumed))
}
