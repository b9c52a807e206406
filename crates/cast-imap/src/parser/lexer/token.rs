use std::borrow::Cow;

/// One lexical unit of a server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Atom; flags such as `\Seen` included.
    Atom(&'a str),
    /// All-digit atom that fits in a `u32`.
    Number(u32),
    /// Quoted string or literal. Borrowed unless unescaping was needed.
    Str(Cow<'a, [u8]>),
    /// `NIL`
    Nil,
    /// `(`
    Open,
    /// `)`
    Close,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// ` `
    Space,
    /// `*`
    Star,
    /// `+`
    Plus,
    /// End of line.
    Crlf,
    /// End of input.
    End,
}
