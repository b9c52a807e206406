/// A server capability this client acts on.
///
/// Everything else is kept verbatim in [`Capability::Other`] so it still
/// shows up in debug logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `STARTTLS`
    StartTls,
    /// `LOGINDISABLED`: LOGIN is refused on this connection.
    LoginDisabled,
    /// `WITHIN` (RFC 5032): SEARCH understands `YOUNGER`/`OLDER`.
    Within,
    /// `LITERAL+` (RFC 7888): literals may be sent without waiting for `+`.
    LiteralPlus,
    /// Any other capability atom.
    Other(String),
}

impl From<&str> for Capability {
    fn from(atom: &str) -> Self {
        const KNOWN: [(&str, Capability); 4] = [
            ("STARTTLS", Capability::StartTls),
            ("LOGINDISABLED", Capability::LoginDisabled),
            ("WITHIN", Capability::Within),
            ("LITERAL+", Capability::LiteralPlus),
        ];
        KNOWN
            .into_iter()
            .find(|(name, _)| atom.eq_ignore_ascii_case(name))
            .map_or_else(|| Self::Other(atom.to_string()), |(_, cap)| cap)
    }
}
