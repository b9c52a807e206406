//! Operations after login: mailbox selection.

use tokio::io::{AsyncRead, AsyncWrite};

use super::{Authenticated, Client, Selected};
use crate::Result;
use crate::command::Command;
use crate::types::MailboxStatus;

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Opens a mailbox.
    pub async fn select(mut self, mailbox: &str) -> Result<(Client<S, Selected>, MailboxStatus)> {
        let completion = self
            .execute(&Command::Select {
                mailbox: mailbox.to_string(),
            })
            .await?;
        let status = MailboxStatus::from_data(&completion.data);
        tracing::debug!(
            mailbox,
            exists = status.exists,
            uid_validity = ?status.uid_validity,
            "Mailbox selected"
        );
        Ok((self.transition(), status))
    }
}
