//! Getting a session onto the wire: settings, transport, framing and the
//! type-state client.

use std::future::Future;
use std::time::Duration;

mod client;
mod config;
mod framed;
mod stream;

pub use client::{Authenticated, Client, NotAuthenticated, Selected};
pub use config::{Config, Security};
pub use framed::FramedStream;
pub use stream::{ImapStream, connect};

/// Runs `fut`, failing with [`crate::Error::Timeout`] once `limit` passes.
pub(crate) async fn bounded<T>(
    operation: &'static str,
    limit: Duration,
    fut: impl Future<Output = crate::Result<T>>,
) -> crate::Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .unwrap_or(Err(crate::Error::Timeout {
            operation,
            after: limit,
        }))
}
