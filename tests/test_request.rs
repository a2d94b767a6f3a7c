use wirehttp::http::parser::ParseError;
use wirehttp::http::request::{ParserState, Request};

fn parsed(raw: &[u8]) -> Request {
    let mut req = Request::new();
    let consumed = req.parse(raw).unwrap();
    assert_eq!(consumed, raw.len());
    req
}

#[test]
fn test_request_starts_in_init() {
    let req = Request::new();

    assert_eq!(req.state(), ParserState::Init);
    assert!(!req.is_done());
    assert!(req.headers.is_empty());
}

#[test]
fn test_request_header_retrieval() {
    let req = parsed(b"GET / HTTP/1.1\r\nHost: example.com\r\nContent-Type: application/json\r\n\r\n");

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_content_length_parsing() {
    let req = parsed(b"POST / HTTP/1.1\r\nContent-Length: 4\r\n\r\nabcd");
    assert_eq!(req.content_length().unwrap(), Some(4));

    let req = parsed(b"GET / HTTP/1.1\r\n\r\n");
    assert_eq!(req.content_length().unwrap(), None);
}

#[test]
fn test_request_path_and_query_string() {
    let req = parsed(b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n");

    assert_eq!(req.target(), "/search?q=rust");
}

#[test]
fn test_request_zero_content_length_completes() {
    let req = parsed(b"POST /api HTTP/1.1\r\nContent-Length: 0\r\n\r\n");

    assert!(req.is_done());
    assert!(req.body.is_empty());
}

#[test]
fn test_request_resumes_after_partial_line() {
    let raw = b"PUT /item HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc";
    let mut req = Request::new();
    let mut pending = Vec::new();

    for &byte in raw {
        pending.push(byte);
        let n = req.parse(&pending).unwrap();
        pending.drain(..n);
    }

    assert!(req.is_done());
    assert!(pending.is_empty());
    assert_eq!(req.method(), "PUT");
    assert_eq!(req.body, b"abc");
}

#[test]
fn test_request_done_consumes_nothing_more() {
    let mut req = parsed(b"GET / HTTP/1.1\r\n\r\n");

    assert_eq!(req.parse(b"GET /again HTTP/1.1\r\n\r\n").unwrap(), 0);
    assert_eq!(req.target(), "/");
}

#[test]
fn test_request_error_messages() {
    let mut req = Request::new();
    let err = req.parse(b"GET / HTTP/1.1\r\nContent-Length: abc\r\n\r\n").unwrap_err();

    assert!(matches!(err, ParseError::InvalidContentLength(_)));
    assert_eq!(err.to_string(), "invalid body: content-length \"abc\" is not a number");
}
