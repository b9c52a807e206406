//! Content-Disposition handling (RFC 2183).

use crate::content_type::parse_parameters;

/// How a part is meant to be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispositionKind {
    /// Displayed as part of the message body.
    #[default]
    Inline,
    /// Separate file for the recipient to save.
    Attachment,
}

/// Parsed Content-Disposition header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Disposition {
    /// Disposition type.
    pub kind: DispositionKind,
    /// Suggested filename, if any.
    pub filename: Option<String>,
}

impl Disposition {
    /// Parses a Content-Disposition value.
    ///
    /// Only `attachment` marks a part as an attachment; `inline` and
    /// unrecognized types are presented inline.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let (kind, params) = s.split_once(';').unwrap_or((s, ""));
        let kind = if kind.trim().eq_ignore_ascii_case("attachment") {
            DispositionKind::Attachment
        } else {
            DispositionKind::Inline
        };
        let filename = parse_parameters(params).remove("filename");
        Self { kind, filename }
    }

    /// Returns true for attachments.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.kind == DispositionKind::Attachment
    }
}
