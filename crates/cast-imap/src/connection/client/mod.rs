//! Type-state IMAP client.
//!
//! ```text
//! NotAuthenticated ── login() ──→ Authenticated ── select() ──→ Selected
//! ```
//!
//! Each state only exposes the commands that are valid in it. LOGOUT is
//! available everywhere and consumes the client.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

pub use self::states::{Authenticated, NotAuthenticated, Selected};
use super::bounded;
use super::framed::FramedStream;
use crate::command::{Command, Request, TagGenerator};
use crate::parser::{Response, ResponseParser, Status, Untagged};
use crate::types::{Capability, ResponseCode};
use crate::{Error, Result};

/// IMAP client connection; `State` tracks the protocol state at compile time.
pub struct Client<S, State> {
    stream: FramedStream<S>,
    tags: TagGenerator,
    capabilities: Vec<Capability>,
    timeout: Option<Duration>,
    _state: PhantomData<State>,
}

impl<S, State> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tags", &self.tags)
            .field("capabilities", &self.capabilities)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// The outcome of one command.
#[derive(Debug)]
pub(crate) struct Completion {
    pub(crate) status: Status,
    pub(crate) code: Option<ResponseCode>,
    pub(crate) text: String,
    /// Untagged data received while the command ran, in arrival order.
    pub(crate) data: Vec<Untagged>,
}

impl Completion {
    /// Turns a NO, BAD or BYE completion into an error.
    pub(crate) fn checked(self, command: &'static str) -> Result<Self> {
        match self.status {
            Status::Ok | Status::PreAuth => Ok(self),
            Status::Bye => Err(Error::Bye(self.text)),
            status => Err(Error::Refused {
                command,
                status,
                text: self.text,
            }),
        }
    }
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn with_parts(stream: FramedStream<S>, tags: TagGenerator, timeout: Option<Duration>) -> Self {
        Self {
            stream,
            tags,
            capabilities: Vec::new(),
            timeout,
            _state: PhantomData,
        }
    }

    /// Moves the connection into another state.
    pub(crate) fn transition<Next>(self) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tags: self.tags,
            capabilities: self.capabilities,
            timeout: self.timeout,
            _state: PhantomData,
        }
    }

    /// Returns the server capabilities last seen.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Checks if the server has a specific capability.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Returns true if the server supports the RFC 5032 YOUNGER/OLDER keys.
    #[must_use]
    pub fn supports_within(&self) -> bool {
        self.has_capability(&Capability::Within)
    }

    /// Sends CAPABILITY and replaces the stored capabilities.
    pub(crate) async fn refresh_capabilities(&mut self) -> Result<()> {
        let completion = self.execute(&Command::Capability).await?;
        for data in completion.data {
            if let Untagged::Capability(caps) = data {
                self.capabilities = caps;
            }
        }
        Ok(())
    }

    /// Sends LOGOUT and drops the connection.
    ///
    /// The reply is waited for on a best-effort basis; a connection that is
    /// already gone still counts as logged out.
    pub async fn logout(mut self) {
        if let Err(error) = self.exchange(&Command::Logout).await {
            tracing::debug!(%error, "LOGOUT not acknowledged");
        }
    }

    /// Runs a command to its tagged completion, whatever the status.
    ///
    /// The configured timeout covers the whole exchange, not each read.
    pub(crate) async fn exchange(&mut self, command: &Command) -> Result<Completion> {
        let tag = self.tags.next_tag();
        let request = command.encode(&tag, self.has_capability(&Capability::LiteralPlus));
        tracing::trace!(%tag, %command, "Sending command");
        within(
            self.timeout,
            command.name(),
            converse(&mut self.stream, &tag, &request),
        )
        .await
    }

    /// Runs a command and fails unless it completes with OK.
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<Completion> {
        self.exchange(command).await?.checked(command.name())
    }
}

/// Awaits `fut`, under `limit` when one is set.
async fn within<T>(
    limit: Option<Duration>,
    operation: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match limit {
        Some(limit) => bounded(operation, limit, fut).await,
        None => fut.await,
    }
}

/// A server response as seen by the command in flight.
enum Event {
    Continue,
    Data(Untagged),
    Done {
        status: Status,
        code: Option<ResponseCode>,
        text: String,
    },
    Skip,
}

fn event(raw: &[u8], tag: &str) -> Result<Event> {
    match ResponseParser::parse(raw) {
        Ok(Response::Continuation(_)) => Ok(Event::Continue),
        Ok(Response::Untagged(data)) => Ok(Event::Data(data)),
        Ok(Response::Tagged {
            tag: seen,
            status,
            code,
            text,
        }) if seen == tag => Ok(Event::Done { status, code, text }),
        Ok(Response::Tagged { tag: seen, .. }) => {
            tracing::warn!(tag = %seen, "Completion for a command not in flight");
            Ok(Event::Skip)
        }
        Err(error) if raw.strip_prefix(tag.as_bytes()).is_some_and(|r| r.starts_with(b" ")) => {
            Err(error)
        }
        Err(error) => {
            tracing::warn!(%error, "Skipping unparseable response");
            Ok(Event::Skip)
        }
    }
}

/// Sends `request` piece by piece and reads until the tagged completion.
///
/// Every piece but the last ends in a synchronizing literal announcement,
/// so the next one goes out only after the server's `+`. A completion in
/// place of the `+` ends the command without sending the rest.
async fn converse<S>(stream: &mut FramedStream<S>, tag: &str, request: &Request) -> Result<Completion>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut data = Vec::new();
    let mut parts = request.parts().iter().peekable();
    while let Some(part) = parts.next() {
        stream.send(part).await?;
        let awaiting_continuation = parts.peek().is_some();
        loop {
            let raw = stream.read_response().await?;
            match event(&raw, tag)? {
                Event::Continue if awaiting_continuation => break,
                Event::Continue | Event::Skip => {}
                Event::Data(untagged) => data.push(untagged),
                Event::Done { status, code, text } => {
                    return Ok(Completion {
                        status,
                        code,
                        text,
                        data,
                    });
                }
            }
        }
    }
    Err(Error::Protocol("empty request".into()))
}
