use std::fmt;

use crate::http::headers::Headers;

/// An HTTP response status code.
///
/// Any numeric code can be written; only the codes with an associated
/// constant carry a reason phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    /// 200 OK
    pub const OK: StatusCode = StatusCode(200);
    /// 400 Bad Request
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    /// 500 Internal Server Error
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    pub const fn from_u16(code: u16) -> Self {
        StatusCode(code)
    }

    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use wirehttp::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.as_u16(), 200);
    /// assert_eq!(StatusCode::from_u16(404).as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns the reason phrase, or an empty string for codes without one.
    ///
    /// # Example
    ///
    /// ```
    /// # use wirehttp::http::response::StatusCode;
    /// assert_eq!(StatusCode::BAD_REQUEST.reason_phrase(), "Bad Request");
    /// assert_eq!(StatusCode::from_u16(418).reason_phrase(), "");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            400 => "Bad Request",
            500 => "Internal Server Error",
            _ => "",
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

/// Headers for a fixed-length, single-shot response.
///
/// Contains `content-length`, `connection: close` and
/// `content-type: text/plain`; any of them can be overridden before the
/// headers are written.
pub fn default_headers(content_len: usize) -> Headers {
    let mut headers = Headers::new();
    headers.override_value("content-length", content_len.to_string());
    headers.override_value("connection", "close");
    headers.override_value("content-type", "text/plain");
    headers
}
