//! Operations on a selected mailbox: UID SEARCH and UID FETCH.

use tokio::io::{AsyncRead, AsyncWrite};

use super::{Client, Selected};
use crate::Result;
use crate::command::{Command, FetchItems, SearchCriteria};
use crate::parser::{FetchItem, Untagged};
use crate::types::Uid;

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Runs UID SEARCH and returns the matching UIDs in server order.
    pub async fn uid_search(&mut self, criteria: SearchCriteria) -> Result<Vec<Uid>> {
        let completion = self.execute(&Command::UidSearch { criteria }).await?;
        let uids: Vec<Uid> = completion
            .data
            .into_iter()
            .filter_map(|data| match data {
                Untagged::Search(hits) => Some(hits),
                _ => None,
            })
            .flatten()
            .filter_map(Uid::new)
            .collect();
        tracing::trace!(count = uids.len(), "UID SEARCH completed");
        Ok(uids)
    }

    /// Fetches one message by UID.
    ///
    /// Servers may interleave unsolicited FETCH data for other messages;
    /// only the response carrying `uid` is returned. `None` means the
    /// message is gone.
    pub async fn uid_fetch(&mut self, uid: Uid, items: FetchItems) -> Result<Option<Vec<FetchItem>>> {
        let completion = self.execute(&Command::UidFetch { uid, items }).await?;
        Ok(completion.data.into_iter().find_map(|data| match data {
            Untagged::Fetch { items, .. }
                if items.iter().any(|item| matches!(item, FetchItem::Uid(u) if *u == uid)) =>
            {
                Some(items)
            }
            _ => None,
        }))
    }
}
