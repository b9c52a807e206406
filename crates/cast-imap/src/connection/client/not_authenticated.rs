//! Operations before login: greeting, STARTTLS and LOGIN.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use super::{Authenticated, Client, NotAuthenticated, within};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::FramedStream;
use crate::connection::{Config, ImapStream, Security, connect};
use crate::parser::{Response, ResponseParser, Status, Untagged};
use crate::types::{Capability, ResponseCode};
use crate::{Error, Result};

impl Client<ImapStream, NotAuthenticated> {
    /// Opens a connection as described by `config`.
    ///
    /// Reads the greeting and, for [`Security::StartTls`], upgrades the
    /// connection before returning. `config.timeout` bounds each step here
    /// and every command sent later.
    pub async fn connect(config: &Config) -> Result<Self> {
        let stream = connect(config).await?;
        let client = Self::greet(FramedStream::new(stream), Some(config.timeout)).await?;

        if config.security == Security::StartTls {
            return client.starttls(&config.host).await;
        }
        Ok(client)
    }

    /// Upgrades a plaintext connection with STARTTLS.
    ///
    /// Capabilities are re-read over the encrypted channel; anything learned
    /// before the upgrade is discarded.
    async fn starttls(mut self, host: &str) -> Result<Self> {
        if self.capabilities.is_empty() {
            self.refresh_capabilities().await?;
        }
        if !self.has_capability(&Capability::StartTls) {
            return Err(Error::Protocol("server does not offer STARTTLS".into()));
        }
        self.execute(&Command::StartTls).await?;

        let plain = self.stream.into_inner();
        let tls = within(
            self.timeout,
            "STARTTLS handshake",
            plain.upgrade_to_tls(host),
        )
        .await?;

        let mut client = Self::with_parts(FramedStream::new(tls), self.tags, self.timeout);
        client.refresh_capabilities().await?;
        tracing::debug!(host, "STARTTLS negotiated");
        Ok(client)
    }
}

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an established stream and reads the server greeting.
    pub async fn from_stream(stream: S) -> Result<Self> {
        Self::greet(FramedStream::new(stream), None).await
    }

    /// Like [`Client::from_stream`], with a deadline for the greeting and
    /// for each later command.
    pub async fn from_stream_with_timeout(stream: S, timeout: Duration) -> Result<Self> {
        Self::greet(FramedStream::new(stream), Some(timeout)).await
    }

    async fn greet(mut stream: FramedStream<S>, timeout: Option<Duration>) -> Result<Self> {
        let greeting = within(timeout, "greeting", stream.read_response()).await?;
        let capabilities = match ResponseParser::parse(&greeting)? {
            Response::Untagged(Untagged::Condition {
                status: Status::Ok,
                code,
                ..
            }) => match code {
                Some(ResponseCode::Capability(caps)) => caps,
                _ => Vec::new(),
            },
            Response::Untagged(Untagged::Condition {
                status: Status::PreAuth,
                ..
            }) => {
                return Err(Error::Protocol(
                    "server greeted with PREAUTH; LOGIN is not possible".into(),
                ));
            }
            Response::Untagged(Untagged::Condition {
                status: Status::Bye,
                text,
                ..
            }) => return Err(Error::Bye(text)),
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        };

        let mut client = Self::with_parts(stream, TagGenerator::default(), timeout);
        client.capabilities = capabilities;
        Ok(client)
    }

    /// Authenticates with LOGIN.
    ///
    /// A NO or BAD completion is reported as [`Error::Auth`].
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        if self.has_capability(&Capability::LoginDisabled) {
            return Err(Error::Auth("LOGIN is disabled by the server".into()));
        }

        let completion = self
            .exchange(&Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;
        match completion.status {
            Status::No | Status::Bad => return Err(Error::Auth(completion.text)),
            Status::Bye => return Err(Error::Bye(completion.text)),
            Status::Ok | Status::PreAuth => {}
        }

        // Servers may announce post-login capabilities either way.
        if let Some(ResponseCode::Capability(caps)) = completion.code {
            self.capabilities = caps;
        }
        for data in completion.data {
            if let Untagged::Capability(caps) = data {
                self.capabilities = caps;
            }
        }
        tracing::debug!(username, "Logged in");
        Ok(self.transition())
    }
}
