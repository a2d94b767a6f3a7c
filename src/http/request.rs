use crate::http::headers::{Headers, find_crlf};
use crate::http::parser::ParseError;

const HTTP_VERSION: &str = "1.1";

/// Progress of a [`Request`] through the incremental parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Waiting for a complete request line.
    Init,
    /// Request line read; consuming header lines until the blank line.
    ParsingHeaders,
    /// Headers read; accumulating up to `Content-Length` body bytes.
    ParsingBody,
    Done,
}

/// The first line of a request, e.g. `GET /index.html HTTP/1.1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    /// Upper-case method name, e.g. `"GET"`
    pub method: String,
    /// Request target exactly as sent, e.g. `"/search?q=rust"`
    pub request_target: String,
    /// Version without the `HTTP/` prefix; always `"1.1"`
    pub http_version: String,
}

/// An HTTP request, either complete or still being parsed.
///
/// Bytes are fed through [`Request::parse`] as they arrive. The request line
/// is filled in first, then the headers, then the body; a request handed to
/// a handler is always in [`ParserState::Done`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub request_line: RequestLine,
    pub headers: Headers,
    pub body: Vec<u8>,
    state: ParserState,
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    pub fn new() -> Self {
        Self {
            request_line: RequestLine::default(),
            headers: Headers::new(),
            body: Vec::new(),
            state: ParserState::Init,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    pub fn method(&self) -> &str {
        &self.request_line.method
    }

    pub fn target(&self) -> &str {
        &self.request_line.request_target
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// The declared body length, if a `Content-Length` header is present.
    pub fn content_length(&self) -> Result<Option<usize>, ParseError> {
        self.headers
            .get("content-length")
            .map(|v| {
                v.parse::<usize>()
                    .map_err(|_| ParseError::InvalidContentLength(v.to_string()))
            })
            .transpose()
    }

    /// Advances the parser over `data` and returns how many bytes were used.
    ///
    /// Consuming fewer bytes than supplied means the remainder is an
    /// incomplete line; the caller keeps it and calls again once more bytes
    /// have been appended. Every body byte offered is consumed; more than the
    /// declared `Content-Length` fails with [`ParseError::BodyTooLong`].
    pub fn parse(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let mut consumed = 0;

        loop {
            match self.state {
                ParserState::Init => {
                    let Some((line, n)) = parse_request_line(&data[consumed..])? else {
                        return Ok(consumed);
                    };
                    self.request_line = line;
                    consumed += n;
                    self.state = ParserState::ParsingHeaders;
                }

                ParserState::ParsingHeaders => {
                    let (n, done) = self.headers.parse_line(&data[consumed..])?;
                    if n == 0 {
                        return Ok(consumed);
                    }
                    consumed += n;
                    if done {
                        self.state = ParserState::ParsingBody;
                    }
                }

                ParserState::ParsingBody => {
                    let Some(declared) = self.content_length()? else {
                        self.state = ParserState::Done;
                        return Ok(consumed);
                    };

                    self.body.extend_from_slice(&data[consumed..]);
                    consumed = data.len();

                    if self.body.len() > declared {
                        return Err(ParseError::BodyTooLong {
                            declared,
                            received: self.body.len(),
                        });
                    }
                    if self.body.len() == declared {
                        self.state = ParserState::Done;
                    }
                    return Ok(consumed);
                }

                ParserState::Done => return Ok(consumed),
            }
        }
    }
}

/// Parses `METHOD SP TARGET SP HTTP/1.1 CRLF` from the front of `data`.
///
/// Returns `None` while no CRLF is present.
fn parse_request_line(data: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let Some(idx) = find_crlf(data) else {
        return Ok(None);
    };

    let line = std::str::from_utf8(&data[..idx]).map_err(|_| ParseError::RequestLineEncoding)?;
    let parts: Vec<&str> = line.split(' ').collect();
    let [method, target, version] = parts[..] else {
        return Err(ParseError::RequestLineParts);
    };

    if method.chars().any(|c| c.is_lowercase()) {
        return Err(ParseError::MethodNotUppercase(method.to_string()));
    }
    if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ParseError::MethodNotAlphabetic(method.to_string()));
    }

    match version.split_once('/') {
        Some(("HTTP", HTTP_VERSION)) => {}
        _ => return Err(ParseError::UnsupportedVersion(version.to_string())),
    }

    let request_line = RequestLine {
        method: method.to_string(),
        request_target: target.to_string(),
        http_version: HTTP_VERSION.to_string(),
    };
    Ok(Some((request_line, idx + 2)))
}
