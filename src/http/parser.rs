use std::cmp::Ordering;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::headers::HeaderError;
use crate::http::request::{ParserState, Request};

/// Initial size of the read buffer; it doubles whenever a read fills it
/// without a complete line becoming parseable.
pub const INITIAL_BUFFER_SIZE: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid request line: must be in `METHOD TARGET VERSION` format")]
    RequestLineParts,
    #[error("invalid request line: not valid UTF-8")]
    RequestLineEncoding,
    #[error("invalid request line: method {0:?} must be in full capital letters")]
    MethodNotUppercase(String),
    #[error("invalid request line: method {0:?} must be alphabetical")]
    MethodNotAlphabetic(String),
    #[error("invalid request line: unsupported version {0:?}, expected HTTP/1.1")]
    UnsupportedVersion(String),
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error("invalid body: content-length {0:?} is not a number")]
    InvalidContentLength(String),
    #[error("end of input before end of request line")]
    EofInRequestLine,
    #[error("end of input before end of headers")]
    EofInHeaders,
    #[error("end of input after {received} body bytes, content-length is {declared}")]
    IncompleteBody { declared: usize, received: usize },
    #[error("body has {received} bytes, content-length is {declared}")]
    BodyTooLong { declared: usize, received: usize },
    #[error("could not read request: {0}")]
    Io(#[from] io::Error),
}

/// Reads one complete request from `reader`.
pub async fn read_request<R>(reader: &mut R) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    read_request_with_capacity(reader, INITIAL_BUFFER_SIZE).await
}

/// Like [`read_request`], starting from a buffer of `capacity` bytes.
pub async fn read_request_with_capacity<R>(reader: &mut R, capacity: usize) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut request = Request::new();
    let mut buf = vec![0u8; capacity.max(1)];
    let mut filled = 0;

    while !request.is_done() {
        if filled == buf.len() {
            buf.resize(buf.len() * 2, 0);
        }

        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;

        let consumed = request.parse(&buf[..filled])?;
        buf.copy_within(consumed..filled, 0);
        filled -= consumed;
    }

    match request.state() {
        ParserState::Init => return Err(ParseError::EofInRequestLine),
        ParserState::ParsingHeaders => return Err(ParseError::EofInHeaders),
        ParserState::ParsingBody | ParserState::Done => {}
    }

    if let Some(declared) = request.content_length()? {
        let received = request.body.len();
        match received.cmp(&declared) {
            Ordering::Less => return Err(ParseError::IncompleteBody { declared, received }),
            Ordering::Greater => return Err(ParseError::BodyTooLong { declared, received }),
            Ordering::Equal => {}
        }
    }

    Ok(request)
}
