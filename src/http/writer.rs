use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::headers::Headers;
use crate::http::response::StatusCode;

const HTTP_VERSION: &str = "HTTP/1.1";
const CRLF: &[u8] = b"\r\n";

/// Which part of the response a [`ResponseWriter`] expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    StatusLine,
    Header,
    Body,
    /// Reached only after the terminating chunk of a chunked body.
    Trailers,
    Done,
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// A write method was called out of order. This is a bug in the caller,
    /// never a network condition.
    #[error("unexpected writer state: expected {expected:?}, found {found:?}")]
    State {
        expected: WriterState,
        found: WriterState,
    },
    #[error("could not write response: {0}")]
    Io(#[from] io::Error),
}

/// Writes a response directly to a byte sink, enforcing the order
/// status line, headers, body, then (for chunked bodies) trailers.
///
/// Nothing is buffered: every call writes through to the sink. A call made
/// in the wrong state fails with [`WriteError::State`] and writes nothing.
///
/// ```ignore
/// let body = b"hello";
/// writer.write_status_line(StatusCode::OK).await?;
/// writer.write_headers(&default_headers(body.len())).await?;
/// writer.write_body(body).await?;
/// ```
pub struct ResponseWriter<W> {
    inner: W,
    state: WriterState,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            state: WriterState::StatusLine,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Writes `HTTP/1.1 <code> <reason>\r\n`.
    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), WriteError> {
        self.check_state(WriterState::StatusLine)?;

        let line = format!("{} {} {}\r\n", HTTP_VERSION, status.as_u16(), status.reason_phrase());
        self.inner.write_all(line.as_bytes()).await?;

        self.state = WriterState::Header;
        Ok(())
    }

    /// Writes every header as `key: value\r\n`, then the blank line.
    pub async fn write_headers(&mut self, headers: &Headers) -> Result<(), WriteError> {
        self.check_state(WriterState::Header)?;

        self.inner.write_all(&serialize_fields(headers, false)).await?;

        self.state = WriterState::Body;
        Ok(())
    }

    /// Writes raw body bytes. May be called repeatedly.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, WriteError> {
        self.check_state(WriterState::Body)?;

        self.inner.write_all(body).await?;
        Ok(body.len())
    }

    /// Writes one chunk: hex length, CRLF, data, CRLF.
    ///
    /// An empty slice writes nothing, since a zero-length chunk would end
    /// the body; use [`write_chunked_body_done`](Self::write_chunked_body_done)
    /// for that.
    pub async fn write_chunked_body(&mut self, chunk: &[u8]) -> Result<usize, WriteError> {
        self.check_state(WriterState::Body)?;

        if chunk.is_empty() {
            return Ok(0);
        }

        let size_line = format!("{:x}\r\n", chunk.len());
        self.inner.write_all(size_line.as_bytes()).await?;
        self.inner.write_all(chunk).await?;
        self.inner.write_all(CRLF).await?;
        Ok(chunk.len())
    }

    /// Writes the terminating `0\r\n` chunk and moves on to trailers.
    pub async fn write_chunked_body_done(&mut self) -> Result<usize, WriteError> {
        self.check_state(WriterState::Body)?;

        let last = b"0\r\n";
        self.inner.write_all(last).await?;

        self.state = WriterState::Trailers;
        Ok(last.len())
    }

    /// Writes trailer fields and the final blank line.
    pub async fn write_trailers(&mut self, trailers: &Headers) -> Result<(), WriteError> {
        self.check_state(WriterState::Trailers)?;

        self.inner.write_all(&serialize_fields(trailers, true)).await?;

        self.state = WriterState::Done;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), WriteError> {
        self.inner.flush().await?;
        Ok(())
    }

    fn check_state(&self, expected: WriterState) -> Result<(), WriteError> {
        if self.state != expected {
            return Err(WriteError::State {
                expected,
                found: self.state,
            });
        }
        Ok(())
    }
}

fn serialize_fields(fields: &Headers, normalize: bool) -> Vec<u8> {
    let mut buf = Vec::new();

    for (key, value) in fields {
        let (key, value) = if normalize {
            (key.trim().to_ascii_lowercase(), value.trim())
        } else {
            (key.to_string(), value)
        };
        buf.extend_from_slice(key.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(CRLF);
    }

    // Header/body separator
    buf.extend_from_slice(CRLF);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::default_headers;

    fn single(key: &str, value: &str) -> Headers {
        let mut headers = Headers::new();
        headers.add(key, value).unwrap();
        headers
    }

    #[tokio::test]
    async fn fixed_length_response() {
        let mut writer = ResponseWriter::new(Vec::new());
        let body = b"hello";

        let mut headers = default_headers(body.len());
        headers.remove("connection");
        headers.remove("content-type");

        writer.write_status_line(StatusCode::OK).await.unwrap();
        writer.write_headers(&headers).await.unwrap();
        writer.write_body(body).await.unwrap();

        assert_eq!(writer.state(), WriterState::Body);
        assert_eq!(
            writer.into_inner(),
            b"HTTP/1.1 200 OK\r\ncontent-length: 5\r\n\r\nhello".to_vec()
        );
    }

    #[tokio::test]
    async fn status_line_reason_phrases() {
        for (code, expected) in [
            (StatusCode::OK, "HTTP/1.1 200 OK\r\n"),
            (StatusCode::BAD_REQUEST, "HTTP/1.1 400 Bad Request\r\n"),
            (StatusCode::INTERNAL_SERVER_ERROR, "HTTP/1.1 500 Internal Server Error\r\n"),
            (StatusCode::from_u16(404), "HTTP/1.1 404 \r\n"),
        ] {
            let mut writer = ResponseWriter::new(Vec::new());
            writer.write_status_line(code).await.unwrap();
            assert_eq!(writer.into_inner(), expected.as_bytes());
        }
    }

    #[tokio::test]
    async fn body_before_status_line_is_rejected() {
        let mut writer = ResponseWriter::new(Vec::new());

        let err = writer.write_body(b"too early").await.unwrap_err();

        assert!(matches!(
            err,
            WriteError::State {
                expected: WriterState::Body,
                found: WriterState::StatusLine
            }
        ));
        assert!(writer.get_ref().is_empty());
    }

    #[tokio::test]
    async fn status_line_twice_is_rejected() {
        let mut writer = ResponseWriter::new(Vec::new());
        writer.write_status_line(StatusCode::OK).await.unwrap();

        assert!(matches!(
            writer.write_status_line(StatusCode::OK).await,
            Err(WriteError::State { .. })
        ));
        assert_eq!(writer.state(), WriterState::Header);
    }

    #[tokio::test]
    async fn trailers_require_chunked_terminator() {
        let mut writer = ResponseWriter::new(Vec::new());
        writer.write_status_line(StatusCode::OK).await.unwrap();
        writer.write_headers(&Headers::new()).await.unwrap();

        assert!(matches!(
            writer.write_trailers(&Headers::new()).await,
            Err(WriteError::State {
                expected: WriterState::Trailers,
                found: WriterState::Body
            })
        ));
    }

    #[tokio::test]
    async fn chunked_response_with_trailers() {
        let mut writer = ResponseWriter::new(Vec::new());

        writer.write_status_line(StatusCode::OK).await.unwrap();
        writer.write_headers(&single("Transfer-Encoding", "chunked")).await.unwrap();
        assert_eq!(writer.write_chunked_body(b"hello world!").await.unwrap(), 12);
        assert_eq!(writer.write_chunked_body(&[b'x'; 26]).await.unwrap(), 26);
        writer.write_chunked_body_done().await.unwrap();
        assert_eq!(writer.state(), WriterState::Trailers);
        writer.write_trailers(&single("X-Content-Length", "38")).await.unwrap();

        assert_eq!(writer.state(), WriterState::Done);
        let expected = [
            "HTTP/1.1 200 OK\r\n",
            "transfer-encoding: chunked\r\n",
            "\r\n",
            "c\r\nhello world!\r\n",
            "1a\r\n",
            &"x".repeat(26),
            "\r\n",
            "0\r\n",
            "x-content-length: 38\r\n",
            "\r\n",
        ]
        .concat();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), expected);
    }

    #[tokio::test]
    async fn empty_chunk_writes_nothing() {
        let mut writer = ResponseWriter::new(Vec::new());
        writer.write_status_line(StatusCode::OK).await.unwrap();
        writer.write_headers(&Headers::new()).await.unwrap();
        let before = writer.get_ref().len();

        assert_eq!(writer.write_chunked_body(b"").await.unwrap(), 0);
        assert_eq!(writer.get_ref().len(), before);
        assert_eq!(writer.state(), WriterState::Body);
    }

    #[tokio::test]
    async fn done_rejects_further_writes() {
        let mut writer = ResponseWriter::new(Vec::new());
        writer.write_status_line(StatusCode::OK).await.unwrap();
        writer.write_headers(&Headers::new()).await.unwrap();
        writer.write_chunked_body_done().await.unwrap();
        writer.write_trailers(&Headers::new()).await.unwrap();

        assert!(writer.write_chunked_body(b"late").await.is_err());
        assert!(writer.write_body(b"late").await.is_err());
        assert!(writer.get_ref().ends_with(b"0\r\n\r\n"));
    }
}
