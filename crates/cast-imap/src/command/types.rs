//! SEARCH keys and FETCH attributes.

/// What UID FETCH asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchItems(Vec<FetchAttribute>);

impl FetchItems {
    /// UID and envelope; enough to validate a candidate.
    #[must_use]
    pub fn envelope() -> Self {
        Self(vec![FetchAttribute::Uid, FetchAttribute::Envelope])
    }

    /// UID, envelope, structure and the raw message, leaving `\Seen` unset.
    #[must_use]
    pub fn full_message() -> Self {
        Self(vec![
            FetchAttribute::Uid,
            FetchAttribute::Envelope,
            FetchAttribute::BodyStructure,
            FetchAttribute::PeekMessage,
        ])
    }

    /// The attributes, in request order.
    #[must_use]
    pub fn attributes(&self) -> &[FetchAttribute] {
        &self.0
    }
}

/// A FETCH attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchAttribute {
    /// `UID`
    Uid,
    /// `ENVELOPE`
    Envelope,
    /// `BODYSTRUCTURE`
    BodyStructure,
    /// `BODY.PEEK[]`: the whole message without marking it read.
    PeekMessage,
}

impl FetchAttribute {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Uid => "UID",
            Self::Envelope => "ENVELOPE",
            Self::BodyStructure => "BODYSTRUCTURE",
            Self::PeekMessage => "BODY.PEEK[]",
        }
    }
}

/// UID SEARCH criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// `SINCE d-Mon-yyyy`: internal date on or after the day.
    Since(String),
    /// `YOUNGER n` (RFC 5032): arrived in the last `n` seconds.
    Younger(u32),
    /// `HEADER name value`: the header contains `value`.
    Header(String, String),
    /// All of the criteria.
    And(Vec<Self>),
    /// Either criterion.
    Or(Box<Self>, Box<Self>),
}

impl SearchCriteria {
    /// `HEADER name value`.
    #[must_use]
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Header(name.into(), value.into())
    }

    /// Chains criteria with OR, nesting to the right. `None` when empty.
    #[must_use]
    pub fn any_of(criteria: Vec<Self>) -> Option<Self> {
        criteria
            .into_iter()
            .rev()
            .reduce(|rest, first| Self::Or(Box::new(first), Box::new(rest)))
    }

    /// Whether every string argument is 7-bit; otherwise SEARCH needs
    /// `CHARSET UTF-8`.
    #[must_use]
    pub fn is_ascii(&self) -> bool {
        match self {
            Self::Younger(_) => true,
            Self::Since(date) => date.is_ascii(),
            Self::Header(name, value) => name.is_ascii() && value.is_ascii(),
            Self::And(all) => all.iter().all(Self::is_ascii),
            Self::Or(a, b) => a.is_ascii() && b.is_ascii(),
        }
    }
}
