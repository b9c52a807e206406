use super::{ResponseCode, Uid};
use crate::parser::Untagged;

/// What SELECT reported about the mailbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Messages in the mailbox.
    pub exists: u32,
    /// UID the next delivered message will get.
    pub uid_next: Option<Uid>,
    /// UIDVALIDITY; UIDs from a different value are meaningless.
    pub uid_validity: Option<u32>,
}

impl MailboxStatus {
    /// Folds the untagged data of a SELECT into a status.
    #[must_use]
    pub fn from_data(data: &[Untagged]) -> Self {
        let mut status = Self::default();
        for item in data {
            match item {
                Untagged::Exists(n) => status.exists = *n,
                Untagged::Condition {
                    code: Some(ResponseCode::UidNext(uid)),
                    ..
                } => status.uid_next = Some(*uid),
                Untagged::Condition {
                    code: Some(ResponseCode::UidValidity(v)),
                    ..
                } => status.uid_validity = Some(*v),
                _ => {}
            }
        }
        status
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::{Response, ResponseParser};

    #[test]
    fn test_from_select_data() {
        let lines: [&[u8]; 6] = [
            b"* FLAGS (\\Answered \\Seen)\r\n",
            b"* 172 EXISTS\r\n",
            b"* 1 RECENT\r\n",
            b"* OK [UNSEEN 12] first unseen\r\n",
            b"* OK [UIDVALIDITY 3857529045] UIDs valid\r\n",
            b"* OK [UIDNEXT 4392] Predicted next UID\r\n",
        ];
        let data: Vec<Untagged> = lines
            .iter()
            .map(|line| match ResponseParser::parse(line).unwrap() {
                Response::Untagged(u) => u,
                other => panic!("Expected untagged data, got {other:?}"),
            })
            .collect();

        let status = MailboxStatus::from_data(&data);
        assert_eq!(status.exists, 172);
        assert_eq!(status.uid_next, Uid::new(4392));
        assert_eq!(status.uid_validity, Some(3_857_529_045));
    }
}
