//! Minimal upstream client used by the `/httpbin/` demo route.
//!
//! Requests are sent as HTTP/1.0 with `Connection: close`, so the upstream
//! delimits the body by closing the connection and never chunks it.

use anyhow::{Context, Result};
use bytes::{Buf, Bytes, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

use crate::http::headers::Headers;
use crate::http::response::StatusCode;

/// Default buffer size for streaming
const BUFFER_SIZE: usize = 8192;

/// Upper bound on status line plus headers
const MAX_HEAD_SIZE: usize = 64 * 1024;

pub struct Upstream {
    base: Url,
    connection_timeout: Duration,
}

/// A response whose head has been read; the body is pulled chunk by chunk.
pub struct UpstreamResponse<S> {
    pub status: StatusCode,
    pub headers: Headers,
    stream: S,
    buffer: BytesMut,
}

impl Upstream {
    pub fn new(base: &str, connection_timeout: Duration) -> Result<Self> {
        let base = Url::parse(base).context("Invalid upstream URL")?;
        if base.scheme() != "http" {
            anyhow::bail!("Unsupported upstream scheme: {}", base.scheme());
        }
        base.host_str().context("Upstream URL missing host")?;

        Ok(Self {
            base,
            connection_timeout,
        })
    }

    /// Connects, sends a GET for `path` (relative to the base URL) and reads
    /// the response head.
    pub async fn fetch(&self, path: &str) -> Result<UpstreamResponse<TcpStream>> {
        let host = self.base.host_str().context("Upstream URL missing host")?;
        let port = self.base.port_or_known_default().unwrap_or(80);

        let mut stream = timeout(self.connection_timeout, TcpStream::connect((host, port)))
            .await
            .context("Connection timeout")?
            .context("Failed to connect to upstream")?;

        stream.write_all(&self.build_request(path)).await?;
        stream.flush().await?;

        tracing::trace!(%host, port, %path, "Request sent to upstream");

        read_response_head(stream).await
    }

    /// Builds the raw request bytes for `path`.
    pub fn build_request(&self, path: &str) -> Vec<u8> {
        let target = format!(
            "{}/{}",
            self.base.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let host = match (self.base.host_str(), self.base.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };

        format!(
            "GET {} HTTP/1.0\r\nHost: {}\r\nUser-Agent: wirehttp\r\nConnection: close\r\n\r\n",
            target, host
        )
        .into_bytes()
    }
}

/// Reads a status line and header block from `stream`.
pub async fn read_response_head<S>(mut stream: S) -> Result<UpstreamResponse<S>>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);
    let mut status = None;
    let mut headers = Headers::new();

    loop {
        if status.is_none() {
            if let Some(idx) = crate::http::headers::find_crlf(&buffer) {
                let line = buffer.split_to(idx + 2);
                status = Some(parse_status_line(&line[..idx])?);
                continue;
            }
        } else {
            let (n, done) = headers
                .parse_line(&buffer)
                .context("Invalid upstream header")?;
            buffer.advance(n);
            if done {
                return Ok(UpstreamResponse {
                    status: status.context("Missing status line")?,
                    headers,
                    stream,
                    buffer,
                });
            }
            if n > 0 {
                continue;
            }
        }

        if buffer.len() > MAX_HEAD_SIZE {
            anyhow::bail!("Response headers too large");
        }

        let n = stream.read_buf(&mut buffer).await?;
        if n == 0 {
            anyhow::bail!("Connection closed before complete response head received");
        }
    }
}

fn parse_status_line(line: &[u8]) -> Result<StatusCode> {
    let line = std::str::from_utf8(line).context("Invalid UTF-8 in status line")?;
    let mut parts = line.splitn(3, ' ');

    match parts.next() {
        Some(version) if version.starts_with("HTTP/") => {}
        _ => anyhow::bail!("Invalid status line: {}", line),
    }
    let code: u16 = parts
        .next()
        .context("Missing status code")?
        .parse()
        .context("Invalid status code")?;

    Ok(StatusCode::from_u16(code))
}

impl<S> UpstreamResponse<S>
where
    S: AsyncRead + Unpin,
{
    /// Returns the next piece of body, or `None` once the upstream closes.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.buffer.is_empty() {
            self.buffer.reserve(BUFFER_SIZE);
            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                return Ok(None);
            }
        }
        Ok(Some(self.buffer.split().freeze()))
    }
}
