//! Turns a fetched candidate into an [`EmailResponse`].

use cast_imap::Envelope;
use cast_mime::Message;
use cast_mime::encoding::decode_rfc2047;
use chrono::{DateTime, FixedOffset};

use super::EmailResponse;
use super::sanitize::sanitize;
use super::session::{FetchedMessage, SessionError};

/// Body used when a reply was found but no text could be extracted.
pub const BODY_PLACEHOLDER: &str = "[Body not available via IMAP, but message found]";

/// Builds the reply from envelope and raw message.
///
/// Header fields come from the envelope; any it lacks are read from the
/// message headers. The body is the inline text parts (HTML only with
/// `full_layout`) joined by newlines with the quoted original removed. A
/// message that does not parse as MIME is used as plain text.
///
/// # Errors
///
/// Returns [`SessionError::Unreadable`] when neither body text nor a sender
/// is available.
pub fn parse_message(
    fetched: &FetchedMessage,
    full_layout: bool,
) -> Result<EmailResponse, SessionError> {
    let mut response = fetched
        .envelope
        .as_ref()
        .map(from_envelope)
        .unwrap_or_default();

    let mut text = None;
    if let Some(raw) = fetched.raw_body() {
        match Message::parse(raw) {
            Ok(message) => {
                fill_from_headers(&mut response, &message);
                let parts = message.inline_texts(full_layout);
                text = Some(parts.join("\n"));
            }
            Err(error) => {
                tracing::debug!(uid = %fetched.uid, %error, "Message is not MIME, using raw text");
                text = Some(String::from_utf8_lossy(raw).into_owned());
            }
        }
    }

    match text.filter(|text| !text.trim().is_empty()) {
        Some(text) => response.body = sanitize(&text),
        None if !response.from.is_empty() => {
            tracing::debug!(uid = %fetched.uid, "No body text, using placeholder");
            response.body = BODY_PLACEHOLDER.to_string();
        }
        None => {
            return Err(SessionError::Unreadable {
                uid: fetched.uid.get(),
                reason: "no body text and no sender",
            });
        }
    }

    Ok(response)
}

fn from_envelope(envelope: &Envelope) -> EmailResponse {
    EmailResponse {
        from: envelope
            .from
            .first()
            .and_then(cast_imap::Address::email)
            .unwrap_or_default(),
        date: envelope.date.as_deref().and_then(parse_date),
        subject: envelope
            .subject
            .as_deref()
            .map(decode_rfc2047)
            .unwrap_or_default(),
        body: String::new(),
    }
}

fn fill_from_headers(response: &mut EmailResponse, message: &Message) {
    if response.from.is_empty() {
        response.from = message.from_address().unwrap_or_default();
    }
    if response.date.is_none() {
        response.date = message.date();
    }
    if response.subject.is_empty() {
        response.subject = message.subject().unwrap_or_default();
    }
}

fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.split('(').next().unwrap_or(value).trim();
    DateTime::parse_from_rfc2822(value).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cast_imap::{Address, Uid};

    fn envelope(from: Option<(&str, &str)>, subject: &str) -> Envelope {
        Envelope {
            date: Some("Tue, 2 Jan 2024 09:05:03 -0300 (BRT)".into()),
            subject: Some(subject.into()),
            from: from
                .map(|(mailbox, host)| {
                    vec![Address {
                        name: None,
                        mailbox: Some(mailbox.into()),
                        host: Some(host.into()),
                    }]
                })
                .unwrap_or_default(),
            ..Envelope::default()
        }
    }

    fn fetched(envelope: Option<Envelope>, raw: Option<&[u8]>) -> FetchedMessage {
        FetchedMessage {
            uid: Uid::new(7).unwrap(),
            envelope,
            sections: raw.map(|raw| vec![(None, raw.to_vec())]).unwrap_or_default(),
        }
    }

    const MULTIPART: &[u8] = b"From: Other <other@example.com>\r\n\
        Subject: ignored\r\n\
        Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
        \r\n\
        --b1\r\n\
        Content-Type: text/plain; charset=utf-8\r\n\
        \r\n\
        Approved\r\n\
        \r\n\
        On Mon, Jan 1, 2024, Ops <ops@example.com> wrote:\r\n\
        > Deploy?\r\n\
        --b1\r\n\
        Content-Type: text/html\r\n\
        \r\n\
        <p>Approved</p>\r\n\
        --b1--\r\n";

    #[test]
    fn test_envelope_fields_win() {
        let message = fetched(
            Some(envelope(Some(("jane", "example.com")), "=?utf-8?Q?Re:_Ol=C3=A1?=")),
            Some(MULTIPART),
        );
        let response = parse_message(&message, false).unwrap();
        assert_eq!(response.from, "jane@example.com");
        assert_eq!(response.subject, "Re: Olá");
        assert_eq!(
            response.date.unwrap().format("%Y-%m-%d %H:%M:%S").to_string(),
            "2024-01-02 09:05:03"
        );
        assert_eq!(response.body, "Approved\r");
    }

    #[test]
    fn test_headers_fill_missing_envelope_fields() {
        let message = fetched(None, Some(MULTIPART));
        let response = parse_message(&message, false).unwrap();
        assert_eq!(response.from, "other@example.com");
        assert_eq!(response.subject, "ignored");
        assert!(response.date.is_none());
    }

    #[test]
    fn test_full_layout_includes_html() {
        let message = fetched(None, Some(MULTIPART));
        let response = parse_message(&message, true).unwrap();
        // The attribution line in the text part cuts everything after it.
        assert_eq!(response.body, "Approved\r");

        let html_first = b"Content-Type: multipart/alternative; boundary=x\r\n\r\n\
            --x\r\nContent-Type: text/html\r\n\r\n<p>Yes</p>\r\n\
            --x\r\nContent-Type: text/plain\r\n\r\nYes\r\n--x--\r\n";
        let message = fetched(Some(envelope(Some(("a", "b.c")), "s")), Some(html_first));
        assert_eq!(parse_message(&message, true).unwrap().body, "<p>Yes</p>\nYes");
        assert_eq!(parse_message(&message, false).unwrap().body, "Yes");
    }

    #[test]
    fn test_attachments_skipped() {
        let raw = b"Content-Type: multipart/mixed; boundary=m\r\n\r\n\
            --m\r\nContent-Type: text/plain\r\n\r\nSee attached\r\n\
            --m\r\nContent-Type: text/plain\r\nContent-Disposition: attachment; filename=\"log.txt\"\r\n\r\nsecret\r\n\
            --m--\r\n";
        let message = fetched(Some(envelope(Some(("a", "b.c")), "s")), Some(raw));
        assert_eq!(parse_message(&message, false).unwrap().body, "See attached");
    }

    #[test]
    fn test_non_mime_falls_back_to_raw_text() {
        let message = fetched(
            Some(envelope(Some(("a", "b.c")), "s")),
            Some(b"no header block here"),
        );
        assert_eq!(parse_message(&message, false).unwrap().body, "no header block here");
    }

    #[test]
    fn test_placeholder_when_body_missing() {
        let message = fetched(Some(envelope(Some(("jane", "example.com")), "s")), None);
        assert_eq!(parse_message(&message, false).unwrap().body, BODY_PLACEHOLDER);

        let html_only = b"Content-Type: text/html\r\n\r\n<p>hi</p>";
        let message = fetched(Some(envelope(Some(("jane", "example.com")), "s")), Some(html_only));
        assert_eq!(parse_message(&message, false).unwrap().body, BODY_PLACEHOLDER);
    }

    #[test]
    fn test_unreadable_without_sender() {
        let message = fetched(Some(envelope(None, "s")), None);
        let err = parse_message(&message, false).unwrap_err();
        assert!(matches!(err, SessionError::Unreadable { uid: 7, .. }));
    }

    #[test]
    fn test_falls_back_to_first_nonempty_section() {
        let mut message = fetched(Some(envelope(Some(("a", "b.c")), "s")), None);
        message.sections = vec![
            (None, Vec::new()),
            (Some("TEXT".into()), b"Subject: x\r\n\r\nFrom the text section".to_vec()),
        ];
        assert_eq!(parse_message(&message, false).unwrap().body, "From the text section");
    }
}
