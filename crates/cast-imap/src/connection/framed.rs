//! Response framing.
//!
//! A response is a CRLF-terminated line, extended by every `{n}` literal it
//! announces at the end of a line: the `n` bytes and the line after them
//! belong to the same response.

#![allow(clippy::missing_errors_doc)]

use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

const MAX_LINE_LENGTH: usize = 1024 * 1024;
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024;

/// Reads whole responses from, and writes raw commands to, a stream.
///
/// Carries no deadline of its own; the client bounds each exchange.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    response: BytesMut,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::new(stream),
            response: BytesMut::with_capacity(8 * 1024),
        }
    }

    /// Reads one response, literals included.
    ///
    /// A bare LF line ending is normalised to CRLF.
    pub async fn read_response(&mut self) -> Result<Bytes> {
        self.response.clear();
        loop {
            let line_start = self.response.len();
            self.read_line().await?;
            let Some(size) = literal_size(&self.response[line_start..]) else {
                return Ok(self.response.split().freeze());
            };
            if size > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal of {size} bytes exceeds {MAX_LITERAL_SIZE}"
                )));
            }
            let at = self.response.len();
            self.response.resize(at + size, 0);
            self.reader.read_exact(&mut self.response[at..]).await?;
        }
    }

    async fn read_line(&mut self) -> Result<()> {
        let start = self.response.len();
        loop {
            let chunk = self.reader.fill_buf().await?;
            if chunk.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "server closed the connection",
                )
                .into());
            }
            let newline = chunk.iter().position(|&b| b == b'\n');
            let take = newline.map_or(chunk.len(), |i| i + 1);
            self.response.extend_from_slice(&chunk[..take]);
            self.reader.consume(take);

            if self.response.len() - start > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".into()));
            }
            if newline.is_some() {
                if !self.response[start..].ends_with(b"\r\n") {
                    self.response.truncate(self.response.len() - 1);
                    self.response.extend_from_slice(b"\r\n");
                }
                return Ok(());
            }
        }
    }

    /// Writes and flushes `bytes`.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(bytes).await?;
        stream.flush().await?;
        Ok(())
    }

    /// The underlying stream.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    /// Unwraps the stream, dropping anything buffered. Only safe between
    /// responses, e.g. right after the STARTTLS completion.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

/// Size of a `{n}` or `{n+}` literal announced at the end of `line`.
fn literal_size(line: &[u8]) -> Option<usize> {
    let inner = line.strip_suffix(b"}\r\n")?;
    let digits = &inner[inner.iter().rposition(|&b| b == b'{')? + 1..];
    let digits = digits.strip_suffix(b"+").unwrap_or(digits);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}
