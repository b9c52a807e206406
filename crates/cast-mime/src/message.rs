//! MIME message structure and inline text extraction.

use crate::charset::decode_charset;
use crate::content_type::ContentType;
use crate::disposition::Disposition;
use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use chrono::{DateTime, FixedOffset};
use std::fmt;

/// Multipart nesting beyond this depth is kept as an opaque leaf.
const MAX_DEPTH: usize = 32;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Entity body: raw bytes or child entities.
#[derive(Debug, Clone)]
pub enum Body {
    /// Leaf content, still transfer-encoded.
    Leaf(Vec<u8>),
    /// Children of a multipart entity, in order.
    Multipart(Vec<Entity>),
}

/// A MIME entity: the message itself or one of its parts.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Entity headers.
    pub headers: Headers,
    /// Parsed Content-Type, `text/plain` when absent or malformed.
    pub content_type: ContentType,
    /// Parsed Content-Disposition, if present.
    pub disposition: Option<Disposition>,
    /// Entity body.
    pub body: Body,
}

impl Entity {
    fn parse(raw: &[u8], depth: usize) -> Result<Self> {
        let (head, body) = split_head(raw).ok_or(Error::MissingSeparator)?;
        let headers = Headers::parse(&String::from_utf8_lossy(head))?;
        Self::from_parts(headers, body, depth)
    }

    /// Parses a multipart child. A part without a blank line is all body.
    fn parse_part(raw: &[u8], depth: usize) -> Result<Self> {
        match split_head(raw) {
            Some((head, body)) => {
                let headers = Headers::parse(&String::from_utf8_lossy(head))?;
                Self::from_parts(headers, body, depth)
            }
            None => Self::from_parts(Headers::new(), raw, depth),
        }
    }

    fn from_parts(headers: Headers, body: &[u8], depth: usize) -> Result<Self> {
        let content_type = headers
            .get("content-type")
            .and_then(|v| ContentType::parse(v).ok())
            .unwrap_or_else(ContentType::text_plain);
        let disposition = headers.get("content-disposition").map(Disposition::parse);

        let body = if content_type.is_multipart() && depth < MAX_DEPTH {
            let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
            let children = split_multipart(body, boundary)?
                .into_iter()
                .map(|part| Self::parse_part(part, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            Body::Multipart(children)
        } else {
            Body::Leaf(body.to_vec())
        };

        Ok(Self {
            headers,
            content_type,
            disposition,
            body,
        })
    }

    /// Returns true if the entity is marked as an attachment.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.disposition
            .as_ref()
            .is_some_and(Disposition::is_attachment)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Decodes a leaf body according to its transfer encoding.
    ///
    /// Returns `None` for multipart entities.
    ///
    /// # Errors
    ///
    /// Returns an error if Base64 decoding fails.
    pub fn decode_body(&self) -> Result<Option<Vec<u8>>> {
        let Body::Leaf(raw) = &self.body else {
            return Ok(None);
        };
        let decoded = match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(raw)?,
            TransferEncoding::QuotedPrintable => decode_quoted_printable(raw),
            _ => raw.clone(),
        };
        Ok(Some(decoded))
    }

    /// Decodes a leaf body to UTF-8 text using the declared charset.
    ///
    /// # Errors
    ///
    /// Returns an error if transfer decoding fails.
    pub fn body_text(&self) -> Result<Option<String>> {
        let charset = self.content_type.charset().unwrap_or("utf-8");
        Ok(self
            .decode_body()?
            .map(|bytes| decode_charset(&bytes, charset)))
    }

    fn collect_inline(&self, include_html: bool, out: &mut Vec<String>) {
        match &self.body {
            Body::Multipart(children) => {
                for child in children {
                    child.collect_inline(include_html, out);
                }
            }
            Body::Leaf(_) => {
                if self.is_attachment() || (self.content_type.is_html() && !include_html) {
                    return;
                }
                if let Ok(Some(text)) = self.body_text() {
                    out.push(text);
                }
            }
        }
    }
}

/// A parsed MIME message.
#[derive(Debug, Clone)]
pub struct Message {
    /// Top-level entity.
    pub root: Entity,
}

impl Message {
    /// Parses a raw RFC 5322 message.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no header block, a header line is
    /// malformed, or a multipart boundary is declared but never found.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Ok(Self {
            root: Entity::parse(raw, 0)?,
        })
    }

    /// Top-level headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.root.headers
    }

    /// Decoded Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.root.headers.get_text("subject")
    }

    /// Bare address of the first From mailbox.
    #[must_use]
    pub fn from_address(&self) -> Option<String> {
        self.root.headers.get("from").and_then(first_address)
    }

    /// Parsed Date header.
    #[must_use]
    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        let value = self.root.headers.get("date")?;
        // Trailing comments like "(UTC)" are not part of the RFC 2822 grammar chrono accepts.
        let value = value.split('(').next().unwrap_or(value).trim();
        DateTime::parse_from_rfc2822(value).ok()
    }

    /// Message-ID header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.root.headers.get("message-id")
    }

    /// Decoded text of every inline leaf, depth-first.
    ///
    /// Attachments are skipped without decoding; `text/html` leaves are
    /// skipped unless `include_html` is set. Leaves that fail to decode are
    /// skipped.
    #[must_use]
    pub fn inline_texts(&self, include_html: bool) -> Vec<String> {
        let mut out = Vec::new();
        self.root.collect_inline(include_html, &mut out);
        out
    }
}

/// Extracts the first address from an address-list header value.
fn first_address(value: &str) -> Option<String> {
    let first = split_address_list(value).into_iter().next()?;
    let address = match (first.rfind('<'), first.rfind('>')) {
        (Some(open), Some(close)) if open < close => &first[open + 1..close],
        _ => first,
    };
    let address = address.trim();
    address.contains('@').then(|| address.to_string())
}

/// Splits on commas that are outside quotes and angle brackets.
fn split_address_list(value: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                items.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(value[start..].trim());
    items.retain(|s| !s.is_empty());
    items
}

/// Splits at the first empty line into header block and body.
fn split_head(raw: &[u8]) -> Option<(&[u8], &[u8])> {
    let mut pos = 0;
    for line in raw.split_inclusive(|&b| b == b'\n') {
        let next = pos + line.len();
        if line.ends_with(b"\n") && trim_line_ending(line).is_empty() {
            return Some((&raw[..pos], &raw[next..]));
        }
        pos = next;
    }
    None
}

/// Splits a multipart body into raw parts (RFC 2046 section 5.1.1).
///
/// The line break before a delimiter belongs to the delimiter. Preamble and
/// epilogue are dropped. A missing close delimiter ends the last part at the
/// end of input.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<&'a [u8]>> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut part_start: Option<usize> = None;
    let mut found = false;
    let mut pos = 0;

    for line in body.split_inclusive(|&b| b == b'\n') {
        let next = pos + line.len();
        let content = trim_line_ending(line).trim_ascii_end();

        if let Some(rest) = content.strip_prefix(delimiter.as_bytes())
            && (rest.is_empty() || rest == b"--")
        {
            found = true;
            if let Some(start) = part_start.take() {
                parts.push(&body[start..strip_break_before(body, start, pos)]);
            }
            if rest == b"--" {
                return Ok(parts);
            }
            part_start = Some(next);
        }
        pos = next;
    }

    if !found {
        return Err(Error::MissingBoundary);
    }
    if let Some(start) = part_start {
        parts.push(&body[start..]);
    }
    Ok(parts)
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn strip_break_before(body: &[u8], start: usize, end: usize) -> usize {
    let mut end = end;
    if end > start && body[end - 1] == b'\n' {
        end -= 1;
        if end > start && body[end - 1] == b'\r' {
            end -= 1;
        }
    }
    end
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALTERNATIVE: &str = concat!(
        "From: \"Silva, Ana\" <ana@example.com>\r\n",
        "Subject: =?utf-8?Q?Re:_Relat=C3=B3rio?=\r\n",
        "Date: Tue, 2 Jan 2024 10:00:00 -0300 (BRT)\r\n",
        "Content-Type: multipart/mixed; boundary=outer\r\n",
        "\r\n",
        "preamble\r\n",
        "--outer\r\n",
        "Content-Type: multipart/alternative; boundary=\"inner\"\r\n",
        "\r\n",
        "--inner\r\n",
        "Content-Type: text/plain; charset=ISO-8859-1\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "Aprovado, pode seguir=2E Obrigad=E1\r\n",
        "--inner\r\n",
        "Content-Type: text/html; charset=utf-8\r\n",
        "\r\n",
        "<p>Aprovado</p>\r\n",
        "--inner--\r\n",
        "--outer\r\n",
        "Content-Type: application/pdf\r\n",
        "Content-Disposition: attachment; filename=\"r.pdf\"\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "not base64 at all!\r\n",
        "--outer--\r\n",
        "epilogue\r\n",
    );

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("BASE64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
    }

    #[test]
    fn test_single_part() {
        let raw = b"From: ana@example.com\nSubject: Hi\n\nHello, World!\n";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.subject().as_deref(), Some("Hi"));
        assert_eq!(message.from_address().as_deref(), Some("ana@example.com"));
        assert_eq!(message.inline_texts(false), vec!["Hello, World!\n"]);
    }

    #[test]
    fn test_nested_multipart_skips_html_and_attachments() {
        let message = Message::parse(ALTERNATIVE.as_bytes()).unwrap();
        assert_eq!(
            message.inline_texts(false),
            vec!["Aprovado, pode seguir. Obrigadá"]
        );
    }

    #[test]
    fn test_full_layout_includes_html() {
        let message = Message::parse(ALTERNATIVE.as_bytes()).unwrap();
        assert_eq!(
            message.inline_texts(true),
            vec!["Aprovado, pode seguir. Obrigadá", "<p>Aprovado</p>"]
        );
    }

    #[test]
    fn test_headers_of_nested_message() {
        let message = Message::parse(ALTERNATIVE.as_bytes()).unwrap();
        assert_eq!(message.subject().as_deref(), Some("Re: Relatório"));
        assert_eq!(message.from_address().as_deref(), Some("ana@example.com"));
        let date = message.date().unwrap();
        assert_eq!(date.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-02 10:00:00");
    }

    #[test]
    fn test_base64_leaf() {
        let raw = concat!(
            "Content-Type: text/plain; charset=utf-8\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "T2zDoSwgdHVkbw==\r\n",
        );
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.inline_texts(false), vec!["Olá, tudo"]);
    }

    #[test]
    fn test_single_part_attachment_yields_nothing() {
        let raw = b"Content-Disposition: attachment\r\n\r\ndata";
        assert!(Message::parse(raw).unwrap().inline_texts(true).is_empty());
    }

    #[test]
    fn test_no_separator_fails() {
        assert!(matches!(
            Message::parse(b"just some text"),
            Err(Error::MissingSeparator)
        ));
    }

    #[test]
    fn test_prose_before_blank_line_fails() {
        assert!(Message::parse(b"Thanks, looks good\n\nAna\n").is_err());
    }

    #[test]
    fn test_boundary_never_found_fails() {
        let raw = b"Content-Type: multipart/mixed; boundary=zz\r\n\r\nno parts here\r\n";
        assert!(matches!(Message::parse(raw), Err(Error::MissingBoundary)));
    }

    #[test]
    fn test_missing_close_delimiter() {
        let raw = b"Content-Type: multipart/mixed; boundary=zz\r\n\r\n--zz\r\n\r\nbody\r\n";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.inline_texts(false), vec!["body\r\n"]);
    }

    #[test]
    fn test_first_address() {
        assert_eq!(
            first_address("\"Doe, John\" <john@example.com>, b@example.com").as_deref(),
            Some("john@example.com")
        );
        assert_eq!(first_address("plain@example.com").as_deref(), Some("plain@example.com"));
        assert_eq!(first_address("undisclosed-recipients:;"), None);
    }

    #[test]
    fn test_split_multipart_ignores_lookalike_lines() {
        let body = b"--b\r\none\r\n--bb\r\nstill one\r\n--b--\r\n";
        let parts = split_multipart(body, "b").unwrap();
        assert_eq!(parts, vec![&b"one\r\n--bb\r\nstill one"[..]]);
    }
}
