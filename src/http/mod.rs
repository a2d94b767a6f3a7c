//! HTTP/1.1 protocol implementation.
//!
//! This module implements request parsing and response writing directly over
//! raw byte streams. Each connection carries exactly one request and one
//! response; there is no keep-alive or pipelining.
//!
//! # Architecture
//!
//! - **`headers`**: Case-insensitive header map with a line-at-a-time parser
//! - **`request`**: Request representation and the resumable parse state machine
//! - **`parser`**: Read loop feeding socket bytes into the state machine
//! - **`response`**: Status codes and default response headers
//! - **`writer`**: Stateful response writer (fixed-length or chunked bodies, trailers)
//! - **`handler`**: The application hook invoked once per request
//! - **`connection`**: Drives one accepted connection from request to close
//!
//! # Request parsing
//!
//! ```text
//!        ┌─────────────┐
//!        │    Init     │ ← Wait for a complete request line
//!        └──────┬──────┘
//!               │ METHOD TARGET HTTP/1.1
//!               ▼
//!        ┌──────────────────┐
//!        │  ParsingHeaders  │ ← One header line at a time
//!        └──────┬───────────┘
//!               │ Blank line
//!               ▼
//!        ┌──────────────────┐
//!        │   ParsingBody    │ ← Up to Content-Length bytes
//!        └──────┬───────────┘
//!               │ Body complete (or no Content-Length)
//!               ▼
//!        ┌──────────────────┐
//!        │      Done        │
//!        └──────────────────┘
//! ```
//!
//! Every step reports how many bytes it consumed, so the result does not
//! depend on how the transport splits the input.
//!
//! # Response writing
//!
//! ```text
//! StatusLine → Header → Body ─┬─ write_body* (fixed length)
//!                             └─ write_chunked_body* → write_chunked_body_done → Trailers → Done
//! ```

pub mod connection;
pub mod handler;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

pub use handler::Handler;
pub use headers::Headers;
pub use request::Request;
pub use response::StatusCode;
pub use writer::ResponseWriter;
