use super::{Capability, Uid};

/// The bracketed code at the start of a status response's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// `[CAPABILITY ...]`, sent with the greeting or after LOGIN.
    Capability(Vec<Capability>),
    /// `[UIDNEXT n]`
    UidNext(Uid),
    /// `[UIDVALIDITY n]`
    UidValidity(u32),
    /// Any other code, by name (`ALERT`, `READ-WRITE`, `AUTHENTICATIONFAILED`, ...).
    Other(String),
}
